//! tabsession - browser-style session state
//!
//! Holds an authentication token, derives the current identity from it,
//! persists it in a per-origin durable store and rehydrates it on the next
//! start. The [`SessionStore`] is the only writer of its storage key.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod storage;

pub use auth::{Identity, SessionStatus, SessionStore};
pub use config::Config;
pub use error::Error;
pub use storage::{DurableStore, FileStore, MemoryStore};
