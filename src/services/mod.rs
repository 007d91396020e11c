//! Service layer for hammerspace
//!
//! Services sit between a boundary layer (the CLI here, an HTTP layer
//! elsewhere) and the repositories. Each one wraps database operations with:
//! - Input validation
//! - Access decisions through the engine
//! - Event emission for audit
//!
//! ## Architecture
//!
//! ```text
//! Boundary layer (thin)
//!     ↓
//! Service Layer (validation + access checks)
//!     ↓
//! Repository Layer (db/*.rs)   ←  access::AccessEngine via SqliteShares
//!     ↓
//! SQLite Database
//! ```

pub mod access_service;
pub mod collection_service;
pub mod events;
pub mod item_service;
pub mod share_service;
pub mod user_service;

pub use access_service::{AccessService, ObjectRef};
pub use collection_service::{
    CollectionService, CollectionView, CreateCollectionInput, PublicCollectionSummary,
};
pub use events::{EventBus, HammerEvent};
pub use item_service::{
    parse_custom_fields, CreateItemInput, ItemService, ItemView, PublicItemSummary,
};
pub use share_service::{GrantOutcome, ShareService};
pub use user_service::{RegisterUserInput, UserService};

use std::sync::Arc;

use crate::access::{Principal, UserId};
use crate::db::HammerDb;
use crate::error::{HammerspaceError, Result};

/// Authenticated user behind a principal, or `Auth`
pub(crate) fn require_user(principal: &Principal) -> Result<&UserId> {
    principal
        .user_id()
        .ok_or_else(|| HammerspaceError::Auth("this operation requires a signed-in user".into()))
}

/// Service container with a shared database and event bus
pub struct Services {
    pub db: Arc<HammerDb>,
    pub users: Arc<UserService>,
    pub collections: Arc<CollectionService>,
    pub items: Arc<ItemService>,
    pub shares: Arc<ShareService>,
    pub access: Arc<AccessService>,
    pub events: Arc<EventBus>,
}

impl Services {
    pub fn new(db: Arc<HammerDb>) -> Self {
        let events = Arc::new(EventBus::new());

        Self {
            users: Arc::new(UserService::new(db.clone(), events.clone())),
            collections: Arc::new(CollectionService::new(db.clone(), events.clone())),
            items: Arc::new(ItemService::new(db.clone(), events.clone())),
            shares: Arc::new(ShareService::new(db.clone(), events.clone())),
            access: Arc::new(AccessService::new(db.clone())),
            db,
            events,
        }
    }

    /// Services over a fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(HammerDb::open_in_memory()?)))
    }
}
