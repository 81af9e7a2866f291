//! Identity and role models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role labels understood by the catalog collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - full access to the catalog
    Admin,
    /// User - can browse and maintain items but not delete them
    User,
    /// Viewer - read-only access
    Viewer,
}

impl UserRole {
    /// Interpret a free-form role label. Unknown labels get the least privilege.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let label = label.strip_prefix("ROLE_").unwrap_or(label);
        match label.to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "user" => UserRole::User,
            _ => UserRole::Viewer,
        }
    }

    /// Whether this role may perform the given catalog action
    pub fn allows(self, action: CatalogAction) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::User => !matches!(action, CatalogAction::Delete),
            UserRole::Viewer => matches!(action, CatalogAction::View),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
            UserRole::Viewer => write!(f, "viewer"),
        }
    }
}

/// Actions the catalog management screen may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogAction {
    View,
    Create,
    Edit,
    Delete,
}

impl CatalogAction {
    pub const ALL: [CatalogAction; 4] = [
        CatalogAction::View,
        CatalogAction::Create,
        CatalogAction::Edit,
        CatalogAction::Delete,
    ];
}

impl fmt::Display for CatalogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogAction::View => write!(f, "view"),
            CatalogAction::Create => write!(f, "create"),
            CatalogAction::Edit => write!(f, "edit"),
            CatalogAction::Delete => write!(f, "delete"),
        }
    }
}

/// UI-facing view of the current user.
///
/// Only ever produced from decoded [`Claims`](crate::auth::Claims), so the
/// fields stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    username: String,
    role: String,
}

impl Identity {
    pub(crate) fn new(username: String, role: String) -> Self {
        Self { username, role }
    }

    /// Taken from the `sub` claim
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Raw role label from the `roles` claim
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Interpreted role
    pub fn role_kind(&self) -> UserRole {
        UserRole::from_label(&self.role)
    }

    /// Check if identity is admin
    pub fn is_admin(&self) -> bool {
        self.role_kind() == UserRole::Admin
    }

    /// Check if the catalog may offer this action to the identity
    pub fn can(&self, action: CatalogAction) -> bool {
        self.role_kind().allows(action)
    }

    /// Every catalog action this identity may perform
    pub fn allowed_actions(&self) -> Vec<CatalogAction> {
        CatalogAction::ALL
            .into_iter()
            .filter(|action| self.can(*action))
            .collect()
    }
}
