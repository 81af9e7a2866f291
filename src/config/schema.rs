//! Configuration schema definitions

use crate::auth::{SessionOptions, DEFAULT_STORAGE_KEY};
use crate::error::Result;
use crate::storage::FileStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Where the durable store lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Origin the store is scoped to, e.g. "https://shop.example.com"
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Key the raw token is stored under
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_dir() -> PathBuf {
    PathBuf::from("./.tabsession")
}

fn default_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            origin: default_origin(),
            key: default_key(),
        }
    }
}

/// Session behaviour
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionConfig {
    /// Erase a persisted token that fails to decode at startup
    #[serde(default)]
    pub clear_invalid_on_rehydrate: bool,
}

impl Config {
    /// Open the durable store described by `[storage]`
    pub fn open_store(&self) -> Result<FileStore> {
        FileStore::open(&self.storage.dir, &self.storage.origin)
    }

    /// Session options described by `[storage]` and `[session]`
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            key: self.storage.key.clone(),
            clear_invalid_on_rehydrate: self.session.clear_invalid_on_rehydrate,
        }
    }
}
