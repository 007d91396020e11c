//! Collection CRUD and listings

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

use super::conflict_on_unique;
use crate::access::{item_is_listed, CollectionVisibility, ItemVisibility, UserId};
use crate::error::Result;
use crate::models::{Collection, CollectionId};

fn collection_from_row(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: CollectionId(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        owner: UserId(row.get("owner_id")?),
        visibility: row.get("visibility")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Partial update; `None` leaves the column alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<CollectionVisibility>,
}

impl CollectionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.visibility.is_none()
    }
}

fn name_taken(name: &str) -> String {
    format!("you already have a collection named '{}'", name)
}

/// Insert a collection; a duplicate (name, owner) is a `Conflict`
pub fn insert_collection(conn: &Connection, collection: &Collection) -> Result<()> {
    conn.execute(
        "INSERT INTO collections (id, name, description, owner_id, visibility,
                                  created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            collection.id.as_str(),
            collection.name,
            collection.description,
            collection.owner.as_str(),
            collection.visibility,
            collection.created_at,
            collection.updated_at,
        ],
    )
    .map_err(|e| conflict_on_unique(e, || name_taken(&collection.name)))?;
    Ok(())
}

pub fn get_collection(conn: &Connection, id: &CollectionId) -> Result<Option<Collection>> {
    Ok(conn
        .query_row(
            "SELECT * FROM collections WHERE id = ?",
            params![id.as_str()],
            collection_from_row,
        )
        .optional()?)
}

pub fn get_collection_by_name(
    conn: &Connection,
    owner: &UserId,
    name: &str,
) -> Result<Option<Collection>> {
    Ok(conn
        .query_row(
            "SELECT * FROM collections WHERE owner_id = ?1 AND name = ?2",
            params![owner.as_str(), name],
            collection_from_row,
        )
        .optional()?)
}

/// Apply a patch. The owner column is never written. Returns the updated row.
pub fn update_collection(
    conn: &Connection,
    id: &CollectionId,
    patch: &CollectionPatch,
    now: DateTime<Utc>,
) -> Result<Option<Collection>> {
    let changed = conn
        .execute(
            "UPDATE collections SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                visibility = COALESCE(?4, visibility),
                updated_at = ?5
             WHERE id = ?1",
            params![
                id.as_str(),
                patch.name,
                patch.description,
                patch.visibility,
                now
            ],
        )
        .map_err(|e| {
            conflict_on_unique(e, || name_taken(patch.name.as_deref().unwrap_or_default()))
        })?;

    if changed == 0 {
        return Ok(None);
    }
    get_collection(conn, id)
}

/// Delete a collection with its items and shares
pub fn delete_collection(conn: &Connection, id: &CollectionId) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM collections WHERE id = ?", params![id.as_str()])?;
    Ok(deleted > 0)
}

/// Collections the user owns or holds a share on, newest first
pub fn list_accessible_collections(
    conn: &Connection,
    user: &UserId,
    limit: u32,
    offset: u32,
) -> Result<Vec<Collection>> {
    // the share join matches at most one row per collection
    let mut stmt = conn.prepare(
        "SELECT c.* FROM collections c
         LEFT JOIN collection_shares s
           ON s.collection_id = c.id AND s.grantee_id = ?1
         WHERE c.owner_id = ?1 OR s.grantee_id IS NOT NULL
         ORDER BY c.created_at DESC, c.rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![user.as_str(), limit, offset], collection_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Collections with exactly this visibility, newest first
pub fn list_by_visibility(
    conn: &Connection,
    visibility: CollectionVisibility,
    limit: u32,
    offset: u32,
) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM collections WHERE visibility = ?1
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(params![visibility, limit, offset], collection_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn count_items(conn: &Connection, id: &CollectionId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM items WHERE collection_id = ?",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

pub fn count_shares(conn: &Connection, id: &CollectionId) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM collection_shares WHERE collection_id = ?",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Items of a collection that would show in public listings
pub fn count_listed_items(conn: &Connection, collection: &Collection) -> Result<u64> {
    let mut stmt = conn.prepare("SELECT visibility FROM items WHERE collection_id = ?")?;
    let visibilities = stmt
        .query_map(params![collection.id.as_str()], |row| {
            row.get::<_, ItemVisibility>(0)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(visibilities
        .into_iter()
        .filter(|v| item_is_listed(*v, collection.visibility))
        .count() as u64)
}
