//! Access service - decisions for a boundary layer that only holds ids

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::access::{AccessDecision, AccessEngine, Action, Principal};
use crate::db::{items, HammerDb, SqliteShares};
use crate::error::{HammerspaceError, Result};
use crate::models::{CollectionId, ItemId};

use super::collection_service::load_collection;

/// Target of a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ObjectRef {
    Collection(CollectionId),
    Item(ItemId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Collection(id) => write!(f, "collection {}", id),
            ObjectRef::Item(id) => write!(f, "item {}", id),
        }
    }
}

pub struct AccessService {
    db: Arc<HammerDb>,
}

impl AccessService {
    pub fn new(db: Arc<HammerDb>) -> Self {
        Self { db }
    }

    /// Load the object (and an item's parent) and decide, in one read
    pub fn decide(
        &self,
        principal: &Principal,
        object: &ObjectRef,
        action: Action,
    ) -> Result<AccessDecision> {
        self.db.with_conn(|conn| {
            let engine = AccessEngine::new(SqliteShares(conn));
            match object {
                ObjectRef::Collection(id) => {
                    let collection = load_collection(conn, id)?;
                    engine.authorize(principal, &collection.access(), action)
                }
                ObjectRef::Item(id) => {
                    let item = items::get_item(conn, id)?
                        .ok_or_else(|| HammerspaceError::NotFound(object.to_string()))?;
                    let parent = load_collection(conn, &item.collection_id)?;
                    engine.authorize(principal, &item.access(&parent), action)
                }
            }
        })
    }

    /// [`decide`](Self::decide), with a deny turned into `Forbidden`
    pub fn require(
        &self,
        principal: &Principal,
        object: &ObjectRef,
        action: Action,
    ) -> Result<AccessDecision> {
        self.decide(principal, object, action)?.into_result()
    }
}
