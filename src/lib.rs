//! Hammerspace - collections of custom-field items with shared access
//!
//! Users keep named collections of items (books, comics, keyboards, ...),
//! each item carrying a free-form JSON object of fields. Collections and items
//! are private, public or unlisted, and a collection can be shared with other
//! users at `view`, `edit` or `manage`.
//!
//! ## Architecture
//!
//! - **access**: the decision core. Ownership, visibility and shares resolve to
//!   a [`PermissionLevel`] per (principal, object); writes and share management
//!   are authorized against it
//! - **db**: SQLite store (users, collections, items, shares)
//! - **services**: validation, access checks and events around the store
//! - **templates**: seeded example collections
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/hammerspace/
//! ├── hammerspace.db       # SQLite database
//! └── config.toml          # Configuration
//! ```

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod templates;

// Re-exports
pub use access::{
    AccessDecision, AccessEngine, Action, CollectionVisibility, ItemVisibility, PermissionLevel,
    Principal, ShareLevel, UserId,
};
pub use config::Config;
pub use db::HammerDb;
pub use error::{HammerspaceError, Result};
pub use models::{Collection, CollectionId, CollectionShare, Item, ItemId, User};
pub use services::{ObjectRef, Services};
