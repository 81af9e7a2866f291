//! Authentication state: token decoding, identities and the session store

pub mod jwt;
pub mod models;
pub mod session;

pub use jwt::{decode, Claims, DecodeError};
pub use models::{CatalogAction, Identity, UserRole};
pub use session::{
    SessionEvent, SessionOptions, SessionState, SessionStatus, SessionStore, SubscriptionId,
    DEFAULT_STORAGE_KEY,
};
