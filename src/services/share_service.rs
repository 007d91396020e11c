//! Share service - grant, revoke and list collection shares
//!
//! Owner only. A `manage` grantee can edit the collection but cannot touch
//! its shares. Grants are addressed by username, as callers know them.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::access::{check_share_mutation, reject_self_share, Principal, ShareLevel};
use crate::db::{shares, users, HammerDb};
use crate::error::{HammerspaceError, Result};
use crate::models::{CollectionId, CollectionShare, ShareId, User};

use super::collection_service::load_collection;
use super::events::{EventBus, HammerEvent};
use super::require_user;

/// Result of a grant
#[derive(Debug, Clone, Serialize)]
pub struct GrantOutcome {
    pub share: CollectionShare,
    /// false when an existing grant's level was overwritten
    pub created: bool,
}

fn load_grantee(conn: &rusqlite::Connection, username: &str) -> Result<User> {
    users::get_user_by_username(conn, username)?
        .ok_or_else(|| HammerspaceError::NotFound(format!("user '{}'", username)))
}

pub struct ShareService {
    db: Arc<HammerDb>,
    events: Arc<EventBus>,
}

impl ShareService {
    pub fn new(db: Arc<HammerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Grants on a collection, newest first
    pub fn list(
        &self,
        principal: &Principal,
        collection_id: &CollectionId,
    ) -> Result<Vec<CollectionShare>> {
        self.db.with_conn(|conn| {
            let collection = load_collection(conn, collection_id)?;
            check_share_mutation(principal, &collection.access(), None)?;
            shares::list_shares(conn, collection_id)
        })
    }

    /// Grant `level` to a user, or overwrite the level they already hold
    pub fn grant(
        &self,
        principal: &Principal,
        collection_id: &CollectionId,
        grantee_username: &str,
        level: &str,
    ) -> Result<GrantOutcome> {
        let granted_by = require_user(principal)?;

        let (share, created) = self.db.with_conn_mut(|conn| {
            let collection = load_collection(conn, collection_id)?;
            let access = collection.access();
            check_share_mutation(principal, &access, None)?;

            let grantee = load_grantee(conn, grantee_username)?;
            reject_self_share(&access, &grantee.id)?;
            let level: ShareLevel = level.parse()?;

            let share = CollectionShare {
                id: ShareId::generate(),
                collection_id: collection.id,
                grantee: grantee.id,
                level,
                granted_by: granted_by.clone(),
                created_at: Utc::now(),
            };
            shares::upsert_share(conn, &share)
        })?;

        info!(
            collection = %share.collection_id,
            grantee = %share.grantee,
            level = %share.level,
            created,
            "Share granted"
        );
        self.events.emit(HammerEvent::ShareGranted {
            collection_id: share.collection_id.to_string(),
            grantee_id: share.grantee.to_string(),
            level: share.level.to_string(),
            created,
        });

        Ok(GrantOutcome { share, created })
    }

    /// Remove a user's grant. Returns whether one existed.
    pub fn revoke(
        &self,
        principal: &Principal,
        collection_id: &CollectionId,
        grantee_username: &str,
    ) -> Result<bool> {
        let (removed, grantee) = self.db.with_conn(|conn| {
            let collection = load_collection(conn, collection_id)?;
            check_share_mutation(principal, &collection.access(), None)?;

            let grantee = load_grantee(conn, grantee_username)?;
            let removed = shares::delete_share(conn, collection_id, &grantee.id)?;
            Ok((removed, grantee))
        })?;

        if removed {
            info!(collection = %collection_id, grantee = %grantee.id, "Share revoked");
            self.events.emit(HammerEvent::ShareRevoked {
                collection_id: collection_id.to_string(),
                grantee_id: grantee.id.to_string(),
            });
        }

        Ok(removed)
    }
}
