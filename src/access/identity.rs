//! Caller identity as seen by the access core
//!
//! The core never authenticates anyone. It receives a [`Principal`] that the
//! boundary layer already resolved: either a known user or anonymous.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Fresh random id for a new user
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The caller an access decision is made for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Principal {
    /// Unauthenticated caller; only public/unlisted baselines apply
    #[default]
    Anonymous,
    /// Authenticated user
    User(UserId),
}

impl Principal {
    pub fn user(id: impl Into<UserId>) -> Self {
        Principal::User(id.into())
    }

    /// The user id, if authenticated
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Principal::Anonymous => None,
            Principal::User(id) => Some(id),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    /// True when this principal is the given owner
    pub fn is(&self, owner: &UserId) -> bool {
        self.user_id() == Some(owner)
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Principal::User(id)
    }
}

impl From<Option<UserId>> for Principal {
    fn from(id: Option<UserId>) -> Self {
        id.map(Principal::User).unwrap_or(Principal::Anonymous)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Anonymous => f.write_str("anonymous"),
            Principal::User(id) => write!(f, "user:{}", id),
        }
    }
}
