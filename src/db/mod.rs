//! SQLite store for users, collections, items and shares
//!
//! ## Tables
//!
//! - `users` - profiles (no credentials)
//! - `collections` - named groups, unique per (name, owner)
//! - `items` - collection entries with a JSON `custom_fields` object
//! - `collection_shares` - one grant per (collection, grantee)
//!
//! Collections cascade to their items and shares. Visibility is stored once
//! per row as text; nothing else records whether a row is public.

pub mod collections;
pub mod items;
pub mod schema;
pub mod shares;
pub mod users;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::access::{CollectionVisibility, ItemVisibility, ShareLevel};
use crate::error::{HammerspaceError, Result};

/// SQLite database behind a single connection
pub struct HammerDb {
    conn: Mutex<Connection>,
}

impl HammerDb {
    /// Open or create the database file, creating its directory if needed
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run reads under the connection lock. One call is one consistent snapshot.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HammerspaceError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Exclusive access, for transactions
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| HammerspaceError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<DbStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64> {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                        row.get(0)
                    })?;
                Ok(n as u64)
            };

            Ok(DbStats {
                user_count: count("users")?,
                collection_count: count("collections")?,
                item_count: count("items")?,
                share_count: count("collection_shares")?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub user_count: u64,
    pub collection_count: u64,
    pub item_count: u64,
    pub share_count: u64,
}

/// True when `err` is a UNIQUE constraint failure
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Map a UNIQUE failure to `Conflict`, pass everything else through
pub(crate) fn conflict_on_unique(
    err: rusqlite::Error,
    message: impl FnOnce() -> String,
) -> HammerspaceError {
    if is_unique_violation(&err) {
        HammerspaceError::Conflict(message())
    } else {
        HammerspaceError::Database(err)
    }
}

macro_rules! text_column {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: HammerspaceError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_column!(CollectionVisibility);
text_column!(ItemVisibility);
text_column!(ShareLevel);

pub use collections::CollectionPatch;
pub use items::ItemPatch;
pub use shares::SqliteShares;
