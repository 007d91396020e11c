//! Collection share rows
//!
//! The (collection_id, grantee_id) UNIQUE constraint is what makes a grant
//! unique; [`upsert_share`] relies on it through `ON CONFLICT DO UPDATE`, so
//! two concurrent grants for the same pair end as one row.

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::access::{ShareLevel, ShareLookup, UserId};
use crate::error::{HammerspaceError, Result};
use crate::models::{CollectionId, CollectionShare, ShareId};

fn share_from_row(row: &Row) -> rusqlite::Result<CollectionShare> {
    Ok(CollectionShare {
        id: ShareId(row.get("id")?),
        collection_id: CollectionId(row.get("collection_id")?),
        grantee: UserId(row.get("grantee_id")?),
        level: row.get("level")?,
        granted_by: UserId(row.get("granted_by")?),
        created_at: row.get("created_at")?,
    })
}

/// Insert a grant or overwrite the level of the existing one.
///
/// Returns the stored row and whether it was newly created. On update the
/// original id and `created_at` are kept.
pub fn upsert_share(
    conn: &mut Connection,
    share: &CollectionShare,
) -> Result<(CollectionShare, bool)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existed = get_share(&tx, &share.collection_id, &share.grantee)?.is_some();

    tx.execute(
        "INSERT INTO collection_shares (id, collection_id, grantee_id, level,
                                        granted_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (collection_id, grantee_id) DO UPDATE SET
            level = excluded.level,
            granted_by = excluded.granted_by",
        params![
            share.id.as_str(),
            share.collection_id.as_str(),
            share.grantee.as_str(),
            share.level,
            share.granted_by.as_str(),
            share.created_at,
        ],
    )?;

    let stored = get_share(&tx, &share.collection_id, &share.grantee)?.ok_or_else(|| {
        HammerspaceError::Internal(format!(
            "share for {} on {} vanished during upsert",
            share.grantee, share.collection_id
        ))
    })?;

    tx.commit()?;
    Ok((stored, !existed))
}

pub fn get_share(
    conn: &Connection,
    collection: &CollectionId,
    grantee: &UserId,
) -> Result<Option<CollectionShare>> {
    Ok(conn
        .query_row(
            "SELECT * FROM collection_shares WHERE collection_id = ?1 AND grantee_id = ?2",
            params![collection.as_str(), grantee.as_str()],
            share_from_row,
        )
        .optional()?)
}

/// Grants on a collection, newest first
pub fn list_shares(conn: &Connection, collection: &CollectionId) -> Result<Vec<CollectionShare>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM collection_shares WHERE collection_id = ?
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![collection.as_str()], share_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn delete_share(
    conn: &Connection,
    collection: &CollectionId,
    grantee: &UserId,
) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM collection_shares WHERE collection_id = ?1 AND grantee_id = ?2",
        params![collection.as_str(), grantee.as_str()],
    )?;
    Ok(deleted > 0)
}

/// Share lookups against an open connection
pub struct SqliteShares<'c>(pub &'c Connection);

impl ShareLookup for SqliteShares<'_> {
    fn lookup(&self, collection: &CollectionId, grantee: &UserId) -> Result<Option<ShareLevel>> {
        Ok(self
            .0
            .query_row(
                "SELECT level FROM collection_shares WHERE collection_id = ?1 AND grantee_id = ?2",
                params![collection.as_str(), grantee.as_str()],
                |row| row.get(0),
            )
            .optional()?)
    }
}
