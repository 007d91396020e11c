//! Collection service - create, read, update, delete and list collections
//!
//! Every check and the write it guards run under one connection guard, so a
//! share revoked concurrently is either seen by the check or lands after the
//! write.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::access::{AccessEngine, Action, CollectionVisibility, PermissionLevel, Principal};
use crate::db::{collections, CollectionPatch, HammerDb, SqliteShares};
use crate::error::{HammerspaceError, Result};
use crate::models::{Collection, CollectionId};

use super::events::{EventBus, HammerEvent};
use super::require_user;

/// Longest accepted collection name
pub const MAX_COLLECTION_NAME_LEN: usize = 200;

/// Input for creating a collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCollectionInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: CollectionVisibility,
}

/// Collection as seen by one principal
#[derive(Debug, Clone, Serialize)]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: Collection,
    pub permission: PermissionLevel,
    pub item_count: u64,
    pub share_count: u64,
}

/// Entry of the public listing
#[derive(Debug, Clone, Serialize)]
pub struct PublicCollectionSummary {
    #[serde(flatten)]
    pub collection: Collection,
    pub public_item_count: u64,
}

pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HammerspaceError::InvalidInput(
            "collection name is required".into(),
        ));
    }
    if name.chars().count() > MAX_COLLECTION_NAME_LEN {
        return Err(HammerspaceError::InvalidInput(format!(
            "collection name must be at most {} characters",
            MAX_COLLECTION_NAME_LEN
        )));
    }
    Ok(())
}

pub(crate) fn load_collection(
    conn: &rusqlite::Connection,
    id: &CollectionId,
) -> Result<Collection> {
    collections::get_collection(conn, id)?
        .ok_or_else(|| HammerspaceError::NotFound(format!("collection {}", id)))
}

pub struct CollectionService {
    db: Arc<HammerDb>,
    events: Arc<EventBus>,
}

impl CollectionService {
    pub fn new(db: Arc<HammerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Collection with the caller's level and counts. Needs read access.
    pub fn get(&self, principal: &Principal, id: &CollectionId) -> Result<CollectionView> {
        self.db.with_conn(|conn| {
            let collection = load_collection(conn, id)?;
            let decision = AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &collection.access(),
                Action::Read,
            )?;
            let permission = decision.level.ok_or_else(|| {
                HammerspaceError::Internal("read allowed without a level".into())
            })?;

            Ok(CollectionView {
                item_count: collections::count_items(conn, id)?,
                share_count: collections::count_shares(conn, id)?,
                collection,
                permission,
            })
        })
    }

    /// Collections the caller owns or is shared on, newest first
    pub fn list_accessible(
        &self,
        principal: &Principal,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Collection>> {
        let user = require_user(principal)?;
        self.db.with_conn(|conn| {
            collections::list_accessible_collections(conn, user, limit, offset)
        })
    }

    /// Public collections only; unlisted ones never appear here
    pub fn list_public(&self, limit: u32, offset: u32) -> Result<Vec<PublicCollectionSummary>> {
        self.db.with_conn(|conn| {
            collections::list_by_visibility(conn, CollectionVisibility::Public, limit, offset)?
                .into_iter()
                .map(|collection| -> Result<PublicCollectionSummary> {
                    Ok(PublicCollectionSummary {
                        public_item_count: collections::count_listed_items(conn, &collection)?,
                        collection,
                    })
                })
                .collect()
        })
    }

    /// Unlisted collections, for direct-link browsing
    pub fn list_unlisted(&self, limit: u32, offset: u32) -> Result<Vec<Collection>> {
        self.db.with_conn(|conn| {
            collections::list_by_visibility(conn, CollectionVisibility::Unlisted, limit, offset)
        })
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create a collection owned by the caller
    pub fn create(
        &self,
        principal: &Principal,
        input: CreateCollectionInput,
    ) -> Result<Collection> {
        let owner = require_user(principal)?;
        validate_collection_name(&input.name)?;

        let now = Utc::now();
        let collection = Collection {
            id: CollectionId::generate(),
            name: input.name.trim().to_string(),
            description: input.description,
            owner: owner.clone(),
            visibility: input.visibility,
            created_at: now,
            updated_at: now,
        };
        self.db
            .with_conn(|conn| collections::insert_collection(conn, &collection))?;

        self.events.emit(HammerEvent::CollectionCreated {
            id: collection.id.to_string(),
            name: collection.name.clone(),
            owner_id: collection.owner.to_string(),
        });

        Ok(collection)
    }

    /// Update name, description or visibility. Needs manage or owner.
    pub fn update(
        &self,
        principal: &Principal,
        id: &CollectionId,
        mut patch: CollectionPatch,
    ) -> Result<Collection> {
        if let Some(name) = patch.name.as_mut() {
            validate_collection_name(name)?;
            *name = name.trim().to_string();
        }

        let updated = self.db.with_conn(|conn| {
            let collection = load_collection(conn, id)?;
            AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &collection.access(),
                Action::WriteUpdate,
            )?;
            if patch.is_empty() {
                return Ok(collection);
            }
            collections::update_collection(conn, id, &patch, Utc::now())?
                .ok_or_else(|| HammerspaceError::NotFound(format!("collection {}", id)))
        })?;

        debug!(id = %updated.id, visibility = %updated.visibility, "Collection updated");
        self.events.emit(HammerEvent::CollectionUpdated {
            id: updated.id.to_string(),
            visibility: updated.visibility.to_string(),
        });

        Ok(updated)
    }

    /// Delete a collection with its items and shares. Needs manage or owner.
    pub fn delete(&self, principal: &Principal, id: &CollectionId) -> Result<()> {
        self.db.with_conn(|conn| {
            let collection = load_collection(conn, id)?;
            AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &collection.access(),
                Action::WriteDelete,
            )?;
            collections::delete_collection(conn, id)
        })?;

        self.events.emit(HammerEvent::CollectionDeleted { id: id.to_string() });
        Ok(())
    }
}
