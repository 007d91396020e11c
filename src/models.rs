//! Stored records for users, collections, items and shares
//!
//! These are the fully loaded rows the services hand to callers. The access
//! engine never sees them directly; it works on the [`CollectionAccess`] and
//! [`ItemAccess`] snapshots built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::access::{
    CollectionAccess, CollectionVisibility, ItemAccess, ItemVisibility, ShareLevel, UserId,
};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Collection primary key
    CollectionId
);
string_id!(
    /// Item primary key
    ItemId
);
string_id!(
    /// Share primary key
    ShareId
);

/// Registered user profile. Credentials live outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Named group of items owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub description: String,
    pub owner: UserId,
    pub visibility: CollectionVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Snapshot used by the access engine
    pub fn access(&self) -> CollectionAccess {
        CollectionAccess {
            id: self.id.clone(),
            owner: self.owner.clone(),
            visibility: self.visibility,
        }
    }
}

/// Entry of a collection with caller-defined fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// Picture reference (path or URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub custom_fields: Map<String, Value>,
    pub owner: UserId,
    pub collection_id: CollectionId,
    pub visibility: ItemVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Snapshot used by the access engine; `parent` must be this item's collection
    pub fn access(&self, parent: &Collection) -> ItemAccess {
        debug_assert_eq!(self.collection_id, parent.id);
        ItemAccess {
            id: self.id.clone(),
            owner: self.owner.clone(),
            visibility: self.visibility,
            collection: parent.access(),
        }
    }
}

/// Grant of a level on a collection to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionShare {
    pub id: ShareId,
    pub collection_id: CollectionId,
    pub grantee: UserId,
    pub level: ShareLevel,
    pub granted_by: UserId,
    pub created_at: DateTime<Utc>,
}
