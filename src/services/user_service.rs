//! User service - profile registration and lookup

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::access::UserId;
use crate::db::{users, HammerDb};
use crate::error::{HammerspaceError, Result};
use crate::models::User;

use super::events::{EventBus, HammerEvent};

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 150;

/// Input for registering a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserInput {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RegisterUserInput {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: true,
            ..Default::default()
        }
    }
}

pub struct UserService {
    db: Arc<HammerDb>,
    events: Arc<EventBus>,
}

impl UserService {
    pub fn new(db: Arc<HammerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Register a profile; a taken username is a `Conflict`
    pub fn register(&self, input: RegisterUserInput) -> Result<User> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(HammerspaceError::InvalidInput("username is required".into()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(HammerspaceError::InvalidInput(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let user = User {
            id: UserId::generate(),
            username: username.to_string(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            is_active: input.is_active,
            created_at: Utc::now(),
        };
        self.db.with_conn(|conn| users::insert_user(conn, &user))?;

        info!(id = %user.id, username = %user.username, "User registered");
        self.events.emit(HammerEvent::UserRegistered {
            id: user.id.to_string(),
            username: user.username.clone(),
        });

        Ok(user)
    }

    pub fn get(&self, id: &UserId) -> Result<Option<User>> {
        self.db.with_conn(|conn| users::get_user(conn, id))
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db
            .with_conn(|conn| users::get_user_by_username(conn, username))
    }

    /// Like [`get_by_username`](Self::get_by_username), but a missing user is `NotFound`
    pub fn require_by_username(&self, username: &str) -> Result<User> {
        self.get_by_username(username)?
            .ok_or_else(|| HammerspaceError::NotFound(format!("user '{}'", username)))
    }

    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>> {
        self.db.with_conn(|conn| users::list_users(conn, limit, offset))
    }
}
