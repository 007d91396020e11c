//! Item CRUD and listings

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::access::{ItemVisibility, UserId};
use crate::error::{HammerspaceError, Result};
use crate::models::{CollectionId, Item, ItemId};

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    let fields_idx = row.as_ref().column_index("custom_fields")?;
    let custom_fields = match row.get::<_, Value>(fields_idx)? {
        Value::Object(map) => map,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                fields_idx,
                Type::Text,
                Box::new(HammerspaceError::InvalidInput(format!(
                    "stored custom_fields is not a JSON object: {}",
                    other
                ))),
            ));
        }
    };
    Ok(Item {
        id: ItemId(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        image: row.get("image")?,
        custom_fields,
        owner: UserId(row.get("owner_id")?),
        collection_id: CollectionId(row.get("collection_id")?),
        visibility: row.get("visibility")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Partial update; `None` leaves the column alone. The parent collection is fixed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Picture reference (path or URL)
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub visibility: Option<ItemVisibility>,
}

pub fn insert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT INTO items (id, name, description, image, custom_fields, owner_id,
                            collection_id, visibility, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            item.id.as_str(),
            item.name,
            item.description,
            item.image,
            Value::Object(item.custom_fields.clone()),
            item.owner.as_str(),
            item.collection_id.as_str(),
            item.visibility,
            item.created_at,
            item.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_item(conn: &Connection, id: &ItemId) -> Result<Option<Item>> {
    Ok(conn
        .query_row(
            "SELECT * FROM items WHERE id = ?",
            params![id.as_str()],
            item_from_row,
        )
        .optional()?)
}

/// Apply a patch and return the updated row
pub fn update_item(
    conn: &Connection,
    id: &ItemId,
    patch: &ItemPatch,
    now: DateTime<Utc>,
) -> Result<Option<Item>> {
    let fields = patch.custom_fields.clone().map(Value::Object);
    let changed = conn.execute(
        "UPDATE items SET
            name = COALESCE(?2, name),
            description = COALESCE(?3, description),
            custom_fields = COALESCE(?4, custom_fields),
            visibility = COALESCE(?5, visibility),
            image = COALESCE(?6, image),
            updated_at = ?7
         WHERE id = ?1",
        params![
            id.as_str(),
            patch.name,
            patch.description,
            fields,
            patch.visibility,
            patch.image,
            now
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_item(conn, id)
}

pub fn delete_item(conn: &Connection, id: &ItemId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM items WHERE id = ?", params![id.as_str()])?;
    Ok(deleted > 0)
}

/// Items in collections the user owns or is shared on, minus other
/// users' private items. Newest first.
pub fn list_accessible_items(
    conn: &Connection,
    user: &UserId,
    collection: Option<&CollectionId>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT i.* FROM items i
         JOIN collections c ON c.id = i.collection_id
         LEFT JOIN collection_shares s
           ON s.collection_id = c.id AND s.grantee_id = ?1
         WHERE (c.owner_id = ?1 OR s.grantee_id IS NOT NULL)
           AND (i.visibility != 'private' OR i.owner_id = ?1)
           AND (?2 IS NULL OR i.collection_id = ?2)
         ORDER BY i.created_at DESC, i.rowid DESC
         LIMIT ?3 OFFSET ?4",
    )?;
    let rows = stmt
        .query_map(
            params![user.as_str(), collection.map(|c| c.as_str()), limit, offset],
            item_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Items whose own visibility is `public` with their collection's name,
/// newest first
pub fn list_public_items(
    conn: &Connection,
    collection: Option<&CollectionId>,
    limit: u32,
    offset: u32,
) -> Result<Vec<(Item, String)>> {
    let mut stmt = conn.prepare(
        "SELECT i.*, c.name AS collection_name FROM items i
         JOIN collections c ON c.id = i.collection_id
         WHERE i.visibility = 'public' AND (?1 IS NULL OR i.collection_id = ?1)
         ORDER BY i.created_at DESC, i.rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(
            params![collection.map(|c| c.as_str()), limit, offset],
            |row| Ok((item_from_row(row)?, row.get("collection_name")?)),
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
