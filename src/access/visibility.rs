//! Visibility modes and the baseline resolver
//!
//! Baseline access is what ownership plus the object's own visibility field
//! decide before any share is consulted:
//! - owner: always granted at `owner`
//! - public collection/item, unlisted collection: granted at `view` to anyone
//! - private collection: undecided, the share registry decides
//! - `collection` item: undecided, the parent collection decides
//! - private item: denied to everyone but the owner, shares never apply
//!
//! There is no stored "is public" flag anywhere; listings derive it with
//! [`CollectionVisibility::is_listed`] and [`item_is_listed`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::identity::{Principal, UserId};
use super::permission::PermissionLevel;
use crate::error::HammerspaceError;

/// Visibility of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionVisibility {
    #[default]
    Private,
    Public,
    /// Readable by anyone holding the link, absent from public listings
    Unlisted,
}

impl CollectionVisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionVisibility::Private => "private",
            CollectionVisibility::Public => "public",
            CollectionVisibility::Unlisted => "unlisted",
        }
    }

    /// Open read access for any principal
    pub fn is_world_readable(self) -> bool {
        matches!(
            self,
            CollectionVisibility::Public | CollectionVisibility::Unlisted
        )
    }

    /// Appears in the public listing
    pub fn is_listed(self) -> bool {
        self == CollectionVisibility::Public
    }
}

impl FromStr for CollectionVisibility {
    type Err = HammerspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(CollectionVisibility::Private),
            "public" => Ok(CollectionVisibility::Public),
            "unlisted" => Ok(CollectionVisibility::Unlisted),
            other => Err(HammerspaceError::InvalidInput(format!(
                "collection visibility '{}' is not valid. Valid values: private, public, unlisted",
                other
            ))),
        }
    }
}

impl fmt::Display for CollectionVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemVisibility {
    Private,
    Public,
    /// Inherit the parent collection's effective access
    #[default]
    Collection,
}

impl ItemVisibility {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemVisibility::Private => "private",
            ItemVisibility::Public => "public",
            ItemVisibility::Collection => "collection",
        }
    }
}

impl FromStr for ItemVisibility {
    type Err = HammerspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(ItemVisibility::Private),
            "public" => Ok(ItemVisibility::Public),
            "collection" => Ok(ItemVisibility::Collection),
            other => Err(HammerspaceError::InvalidInput(format!(
                "item visibility '{}' is not valid. Valid values: private, public, collection",
                other
            ))),
        }
    }
}

impl fmt::Display for ItemVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the baseline check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// Decided without shares
    Granted(PermissionLevel),
    /// Private collection: look up a share for the principal
    ConsultShares,
    /// Item follows its parent collection's full resolution
    Inherit,
    /// Terminal deny, no share fallback
    Denied,
}

/// Baseline for a collection
pub fn collection_baseline(
    owner: &UserId,
    visibility: CollectionVisibility,
    principal: &Principal,
) -> Baseline {
    if principal.is(owner) {
        return Baseline::Granted(PermissionLevel::Owner);
    }
    if visibility.is_world_readable() {
        return Baseline::Granted(PermissionLevel::View);
    }
    Baseline::ConsultShares
}

/// Baseline for an item
pub fn item_baseline(
    owner: &UserId,
    visibility: ItemVisibility,
    principal: &Principal,
) -> Baseline {
    if principal.is(owner) {
        return Baseline::Granted(PermissionLevel::Owner);
    }
    match visibility {
        ItemVisibility::Public => Baseline::Granted(PermissionLevel::View),
        ItemVisibility::Collection => Baseline::Inherit,
        ItemVisibility::Private => Baseline::Denied,
    }
}

/// Whether an item shows up in public listings and public item counts
pub fn item_is_listed(item: ItemVisibility, parent: CollectionVisibility) -> bool {
    match item {
        ItemVisibility::Public => true,
        ItemVisibility::Collection => parent.is_listed(),
        ItemVisibility::Private => false,
    }
}
