//! Error types for tabsession

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The durable store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// The session was used outside its initialization scope. This is a
    /// wiring bug in the caller, never a runtime state.
    #[error("Session contract violation: {0}")]
    ContractViolation(String),

    #[error("Config file not found. Run 'tabsession init' first.")]
    ConfigNotFound,
}

pub type Result<T> = std::result::Result<T, Error>;
