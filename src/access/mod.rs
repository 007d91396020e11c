//! Authorization and visibility core
//!
//! Decides, for any (principal, collection or item) pair, whether access is
//! allowed and at what [`PermissionLevel`]. Storage is reached only through
//! [`ShareLookup`]; everything else here is pure.

pub mod engine;
pub mod identity;
pub mod permission;
pub mod shares;
pub mod visibility;

pub use engine::{
    AccessDecision, AccessEngine, AccessSubject, CollectionAccess, ItemAccess, SubjectKind,
};
pub use identity::{Principal, UserId};
pub use permission::{Action, PermissionLevel, ShareLevel};
pub use shares::{check_share_mutation, reject_self_share, ShareLookup, ShareRegistry};
pub use visibility::{
    collection_baseline, item_baseline, item_is_listed, Baseline, CollectionVisibility,
    ItemVisibility,
};
