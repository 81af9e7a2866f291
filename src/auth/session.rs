//! Session management
//!
//! [`SessionStore`] is the single authority for who the current user is
//! during one process lifetime. Lifecycle:
//! `new -> initialize -> (login | logout)* -> into_store`.
//!
//! Until [`SessionStore::initialize`] has run, the store is rehydrating and
//! an absent identity means "unknown yet", not "logged out". Consumers
//! should branch on [`SessionStore::status`] rather than on the identity
//! alone.

use crate::auth::jwt::{self, Claims};
use crate::auth::models::Identity;
use crate::error::{Error, Result};
use crate::storage::DurableStore;
use serde::Serialize;
use std::fmt;

/// Durable key the raw token is stored under
pub const DEFAULT_STORAGE_KEY: &str = "token";

/// Tunables for a [`SessionStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Durable key holding the raw token
    pub key: String,
    /// Erase a persisted token that fails to decode during rehydration
    pub clear_invalid_on_rehydrate: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            clear_invalid_on_rehydrate: false,
        }
    }
}

/// An adopted token together with everything derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    token: String,
    claims: Claims,
    identity: Identity,
}

impl Session {
    fn new(token: String, claims: Claims) -> Self {
        let identity = claims.to_identity();
        Self {
            token,
            claims,
            identity,
        }
    }
}

/// Snapshot of the consumer-visible session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub token: Option<String>,
    pub identity: Option<Identity>,
    pub rehydrating: bool,
}

/// What a consumer is allowed to conclude about the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus<'a> {
    /// Durable storage has not been read yet; identity is unknown
    Rehydrating,
    /// Confirmed logged out
    Anonymous,
    Authenticated(&'a Identity),
}

/// Notifications delivered to subscribers after a state change is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Rehydrated { authenticated: bool },
    LoggedIn(Identity),
    LoggedOut,
}

/// Handle returned by [`SessionStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&SessionEvent)>;

/// Owns the current token and identity, backed by a durable store
pub struct SessionStore<S: DurableStore> {
    store: S,
    options: SessionOptions,
    session: Option<Session>,
    rehydrating: bool,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl<S: DurableStore> SessionStore<S> {
    /// Create a session store in the rehydrating state
    pub fn new(store: S) -> Self {
        Self::with_options(store, SessionOptions::default())
    }

    pub fn with_options(store: S, options: SessionOptions) -> Self {
        Self {
            store,
            options,
            session: None,
            rehydrating: true,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Read the persisted token once and leave the rehydrating state.
    ///
    /// A token that fails to decode leaves the session logged out. Whatever
    /// happens, `rehydrating` is false when this returns. Calling it a
    /// second time is a contract violation.
    pub fn initialize(&mut self) -> Result<()> {
        if !self.rehydrating {
            return Err(Error::ContractViolation(
                "initialize called more than once".to_string(),
            ));
        }

        let outcome = self.rehydrate();
        self.rehydrating = false;

        let authenticated = self.session.is_some();
        tracing::debug!(authenticated, "session rehydrated");
        self.notify(&SessionEvent::Rehydrated { authenticated });

        outcome
    }

    fn rehydrate(&mut self) -> Result<()> {
        let Some(token) = self.store.get(&self.options.key)? else {
            return Ok(());
        };

        match jwt::decode(&token) {
            Ok(claims) => {
                self.session = Some(Session::new(token, claims));
            }
            Err(error) => {
                tracing::warn!(%error, "persisted token could not be decoded; starting logged out");
                if self.options.clear_invalid_on_rehydrate {
                    self.store.remove(&self.options.key)?;
                }
            }
        }

        Ok(())
    }

    /// Adopt a token.
    ///
    /// Returns `Ok(false)` without touching any state when the token is
    /// empty or cannot be decoded. Otherwise the token is persisted and
    /// adopted, and `Ok(true)` is returned.
    pub fn login(&mut self, token: &str) -> Result<bool> {
        self.ensure_initialized("login")?;

        if token.is_empty() {
            tracing::debug!("ignoring login with empty token");
            return Ok(false);
        }

        let claims = match jwt::decode(token) {
            Ok(claims) => claims,
            Err(error) => {
                tracing::warn!(%error, "rejected login token");
                return Ok(false);
            }
        };

        // Persist first: if the store fails, in-memory state is untouched.
        self.store.set(&self.options.key, token)?;
        let session = Session::new(token.to_string(), claims);
        let identity = session.identity.clone();
        self.session = Some(session);

        tracing::info!(username = %identity.username(), role = %identity.role(), "logged in");
        self.notify(&SessionEvent::LoggedIn(identity));
        Ok(true)
    }

    /// Drop the current session and erase the persisted token. Idempotent.
    pub fn logout(&mut self) -> Result<()> {
        self.ensure_initialized("logout")?;

        self.store.remove(&self.options.key)?;
        if let Some(previous) = self.session.take() {
            tracing::info!(username = %previous.identity.username(), "logged out");
            self.notify(&SessionEvent::LoggedOut);
        }
        Ok(())
    }

    /// Current raw token, absent while rehydrating or logged out
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Current identity, absent while rehydrating or logged out
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.identity()
    }

    /// Full decoded claims of the current token
    pub fn claims(&self) -> Option<&Claims> {
        self.session.as_ref().map(|s| &s.claims)
    }

    pub fn is_rehydrating(&self) -> bool {
        self.rehydrating
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> SessionStatus<'_> {
        if self.rehydrating {
            return SessionStatus::Rehydrating;
        }
        match self.identity() {
            Some(identity) => SessionStatus::Authenticated(identity),
            None => SessionStatus::Anonymous,
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            token: self.token().map(str::to_string),
            identity: self.identity().cloned(),
            rehydrating: self.rehydrating,
        }
    }

    /// Durable key this store reads and writes
    pub fn key(&self) -> &str {
        &self.options.key
    }

    /// Register an observer called after every completed transition
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Read access to the underlying durable store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tear the session down and hand back the durable store
    pub fn into_store(self) -> S {
        self.store
    }

    fn ensure_initialized(&self, operation: &str) -> Result<()> {
        if self.rehydrating {
            return Err(Error::ContractViolation(format!(
                "{} called before the session was initialized",
                operation
            )));
        }
        Ok(())
    }

    fn notify(&mut self, event: &SessionEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

impl<S: DurableStore> fmt::Debug for SessionStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &self.options.key)
            .field("authenticated", &self.session.is_some())
            .field("rehydrating", &self.rehydrating)
            .field("observers", &self.observers.len())
            .finish()
    }
}
