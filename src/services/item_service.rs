//! Item service - items inside collections
//!
//! Item writes are decided on the parent collection's level (edit or above),
//! except for the item's own owner. Listing filters every row through the
//! engine so other users' private items never leak.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::access::{AccessEngine, Action, ItemVisibility, PermissionLevel, Principal};
use crate::db::{items, HammerDb, ItemPatch, SqliteShares};
use crate::error::{HammerspaceError, Result};
use crate::models::{Collection, CollectionId, Item, ItemId};

use super::collection_service::load_collection;
use super::events::{EventBus, HammerEvent};
use super::require_user;

/// Longest accepted item name
pub const MAX_ITEM_NAME_LEN: usize = 200;

/// Input for creating an item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub collection_id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Picture reference (path or URL)
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub visibility: ItemVisibility,
}

/// Item as seen by one principal
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub collection_name: String,
    pub permission: PermissionLevel,
}

/// Entry of the public item listing
#[derive(Debug, Clone, Serialize)]
pub struct PublicItemSummary {
    #[serde(flatten)]
    pub item: Item,
    pub collection_name: String,
}

/// Parse caller-supplied custom fields; anything but a JSON object is rejected
pub fn parse_custom_fields(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(HammerspaceError::InvalidInput(format!(
            "custom_fields must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn validate_item_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HammerspaceError::InvalidInput("item name is required".into()));
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(HammerspaceError::InvalidInput(format!(
            "item name must be at most {} characters",
            MAX_ITEM_NAME_LEN
        )));
    }
    Ok(())
}

/// Item plus its parent, loaded under one guard
fn load_item(conn: &rusqlite::Connection, id: &ItemId) -> Result<(Item, Collection)> {
    let item = items::get_item(conn, id)?
        .ok_or_else(|| HammerspaceError::NotFound(format!("item {}", id)))?;
    let parent = load_collection(conn, &item.collection_id)?;
    Ok((item, parent))
}

pub struct ItemService {
    db: Arc<HammerDb>,
    events: Arc<EventBus>,
}

impl ItemService {
    pub fn new(db: Arc<HammerDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Item with the caller's level. Needs read access.
    pub fn get(&self, principal: &Principal, id: &ItemId) -> Result<ItemView> {
        self.db.with_conn(|conn| {
            let (item, parent) = load_item(conn, id)?;
            let decision = AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &item.access(&parent),
                Action::Read,
            )?;
            let permission = decision.level.ok_or_else(|| {
                HammerspaceError::Internal("read allowed without a level".into())
            })?;
            Ok(ItemView {
                item,
                collection_name: parent.name,
                permission,
            })
        })
    }

    /// Items in collections the caller owns or is shared on, newest first
    pub fn list_accessible(
        &self,
        principal: &Principal,
        collection: Option<&CollectionId>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Item>> {
        let user = require_user(principal)?;
        self.db.with_conn(|conn| {
            let rows = items::list_accessible_items(conn, user, collection, limit, offset)?;
            let engine = AccessEngine::new(SqliteShares(conn));
            let mut parents: HashMap<CollectionId, Collection> = HashMap::new();
            let mut visible = Vec::with_capacity(rows.len());

            for item in rows {
                if !parents.contains_key(&item.collection_id) {
                    let parent = load_collection(conn, &item.collection_id)?;
                    parents.insert(parent.id.clone(), parent);
                }
                let Some(parent) = parents.get(&item.collection_id) else {
                    continue;
                };
                if engine.can_access(principal, &item.access(parent))? {
                    visible.push(item);
                }
            }
            Ok(visible)
        })
    }

    /// Items whose own visibility is public
    pub fn list_public(
        &self,
        collection: Option<&CollectionId>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PublicItemSummary>> {
        let rows = self
            .db
            .with_conn(|conn| items::list_public_items(conn, collection, limit, offset))?;
        Ok(rows
            .into_iter()
            .map(|(item, collection_name)| PublicItemSummary {
                item,
                collection_name,
            })
            .collect())
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Create an item. Needs edit or above on the collection.
    pub fn create(&self, principal: &Principal, input: CreateItemInput) -> Result<Item> {
        let owner = require_user(principal)?;
        validate_item_name(&input.name)?;

        let item = self.db.with_conn(|conn| {
            let parent = load_collection(conn, &input.collection_id)?;
            let level = AccessEngine::new(SqliteShares(conn))
                .collection_permission(principal, &parent.access())?;

            if !level.is_some_and(|l| l.satisfies(PermissionLevel::Edit)) {
                debug!(
                    principal = %principal,
                    collection = %parent.id,
                    level = ?level,
                    "item creation denied"
                );
                return Err(HammerspaceError::Forbidden(format!(
                    "adding items to collection {} needs edit access",
                    parent.id
                )));
            }

            let now = Utc::now();
            let item = Item {
                id: ItemId::generate(),
                name: input.name.trim().to_string(),
                description: input.description,
                image: input.image,
                custom_fields: input.custom_fields,
                owner: owner.clone(),
                collection_id: parent.id,
                visibility: input.visibility,
                created_at: now,
                updated_at: now,
            };
            items::insert_item(conn, &item)?;
            Ok(item)
        })?;

        self.events.emit(HammerEvent::ItemCreated {
            id: item.id.to_string(),
            collection_id: item.collection_id.to_string(),
            owner_id: item.owner.to_string(),
        });

        Ok(item)
    }

    /// Update an item. Needs edit on the parent collection, or item ownership.
    pub fn update(&self, principal: &Principal, id: &ItemId, mut patch: ItemPatch) -> Result<Item> {
        if let Some(name) = patch.name.as_mut() {
            validate_item_name(name)?;
            *name = name.trim().to_string();
        }

        let updated = self.db.with_conn(|conn| {
            let (item, parent) = load_item(conn, id)?;
            AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &item.access(&parent),
                Action::WriteUpdate,
            )?;
            items::update_item(conn, id, &patch, Utc::now())?
                .ok_or_else(|| HammerspaceError::NotFound(format!("item {}", id)))
        })?;

        self.events.emit(HammerEvent::ItemUpdated {
            id: updated.id.to_string(),
        });
        Ok(updated)
    }

    /// Delete an item. Same rule as update.
    pub fn delete(&self, principal: &Principal, id: &ItemId) -> Result<()> {
        self.db.with_conn(|conn| {
            let (item, parent) = load_item(conn, id)?;
            AccessEngine::new(SqliteShares(conn)).require(
                principal,
                &item.access(&parent),
                Action::WriteDelete,
            )?;
            items::delete_item(conn, id)
        })?;

        self.events.emit(HammerEvent::ItemDeleted { id: id.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CollectionVisibility;
    use crate::services::{CreateCollectionInput, RegisterUserInput, Services};

    #[test]
    fn test_parse_custom_fields() {
        let fields = parse_custom_fields(r#"{"isbn": "978-0441013593", "pages": 412}"#).unwrap();
        assert_eq!(fields.len(), 2);

        assert!(matches!(
            parse_custom_fields("[1, 2]"),
            Err(HammerspaceError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_custom_fields("{not json"),
            Err(HammerspaceError::Json(_))
        ));
    }

    #[test]
    fn test_item_name_limits() {
        assert!(validate_item_name("Dune").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_views_carry_collection_name() {
        let services = Services::in_memory().unwrap();
        let alice = services
            .users
            .register(RegisterUserInput::new("alice"))
            .unwrap();
        let owner = Principal::User(alice.id);
        let shelf = services
            .collections
            .create(
                &owner,
                CreateCollectionInput {
                    name: "Vinyl".into(),
                    visibility: CollectionVisibility::Public,
                    ..Default::default()
                },
            )
            .unwrap();
        let record = services
            .items
            .create(
                &owner,
                CreateItemInput {
                    collection_id: shelf.id.clone(),
                    name: "Blue Train".into(),
                    description: String::new(),
                    image: Some("sleeves/blue-train.png".into()),
                    custom_fields: Map::new(),
                    visibility: ItemVisibility::Public,
                },
            )
            .unwrap();

        let view = services
            .items
            .get(&Principal::Anonymous, &record.id)
            .unwrap();
        assert_eq!(view.collection_name, "Vinyl");
        assert_eq!(view.permission, PermissionLevel::View);
        assert_eq!(view.item.image.as_deref(), Some("sleeves/blue-train.png"));

        let public = services.items.list_public(None, 10, 0).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].collection_name, "Vinyl");

        let body = serde_json::to_value(&public[0]).unwrap();
        assert_eq!(body["collection_name"], "Vinyl");
        assert_eq!(body["name"], "Blue Train");
        assert_eq!(body["image"], "sleeves/blue-train.png");
    }
}
