//! Access engine
//!
//! The one place decision logic lives. The engine is written once against
//! [`AccessSubject`], which both [`CollectionAccess`] and [`ItemAccess`]
//! implement: each supplies its own baseline and the collection whose shares
//! (and write rule) apply to it.
//!
//! ## Resolution order
//!
//! 1. baseline from ownership + visibility (owner, public, unlisted)
//! 2. private collection: stored share for the principal
//! 3. `collection` item: the parent collection's full resolution
//! 4. private item of someone else: nothing
//!
//! Nothing is cached. Every call reads the [`ShareLookup`] it was built with,
//! so a revoked share or a visibility change is reflected on the next call.

use serde::{Deserialize, Serialize};
use std::fmt;

use tracing::debug;

use super::identity::{Principal, UserId};
use super::permission::{Action, PermissionLevel};
use super::shares::ShareLookup;
use super::visibility::{
    collection_baseline, item_baseline, Baseline, CollectionVisibility, ItemVisibility,
};
use crate::error::{HammerspaceError, Result};
use crate::models::{CollectionId, ItemId};

/// Which kind of object a decision is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Collection,
    Item,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Collection => f.write_str("collection"),
            SubjectKind::Item => f.write_str("item"),
        }
    }
}

/// Anything the engine can decide access for
pub trait AccessSubject {
    fn kind(&self) -> SubjectKind;

    fn id(&self) -> &str;

    fn owner(&self) -> &UserId;

    /// Decision from ownership and visibility alone
    fn baseline(&self, principal: &Principal) -> Baseline;

    /// Collection whose shares and write rule apply (itself, or an item's parent)
    fn share_target(&self) -> &CollectionAccess;
}

/// Authorization-relevant view of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionAccess {
    pub id: CollectionId,
    pub owner: UserId,
    pub visibility: CollectionVisibility,
}

impl AccessSubject for CollectionAccess {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Collection
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn baseline(&self, principal: &Principal) -> Baseline {
        collection_baseline(&self.owner, self.visibility, principal)
    }

    fn share_target(&self) -> &CollectionAccess {
        self
    }
}

/// Authorization-relevant view of an item, loaded together with its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAccess {
    pub id: ItemId,
    pub owner: UserId,
    pub visibility: ItemVisibility,
    pub collection: CollectionAccess,
}

impl AccessSubject for ItemAccess {
    fn kind(&self) -> SubjectKind {
        SubjectKind::Item
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn baseline(&self, principal: &Principal) -> Baseline {
        item_baseline(&self.owner, self.visibility, principal)
    }

    fn share_target(&self) -> &CollectionAccess {
        &self.collection
    }
}

/// Result of [`AccessEngine::authorize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub action: Action,
    pub allowed: bool,
    /// Level the decision was made on: the object's own level for reads,
    /// the parent collection's level for item writes
    pub level: Option<PermissionLevel>,
    pub reason: String,
}

impl AccessDecision {
    fn allow(action: Action, level: PermissionLevel, reason: impl Into<String>) -> Self {
        Self {
            action,
            allowed: true,
            level: Some(level),
            reason: reason.into(),
        }
    }

    fn deny(action: Action, level: Option<PermissionLevel>, reason: impl Into<String>) -> Self {
        Self {
            action,
            allowed: false,
            level,
            reason: reason.into(),
        }
    }

    /// Turn a deny into [`HammerspaceError::Forbidden`]
    pub fn into_result(self) -> Result<Self> {
        if self.allowed {
            Ok(self)
        } else {
            Err(HammerspaceError::Forbidden(format!(
                "{} denied: {}",
                self.action, self.reason
            )))
        }
    }
}

/// Decision function over a share source
#[derive(Debug, Clone)]
pub struct AccessEngine<S> {
    shares: S,
}

impl<S: ShareLookup> AccessEngine<S> {
    pub fn new(shares: S) -> Self {
        Self { shares }
    }

    /// True when the principal may read the object
    pub fn can_access<O: AccessSubject + ?Sized>(
        &self,
        principal: &Principal,
        object: &O,
    ) -> Result<bool> {
        Ok(self.permission_of(principal, object)?.is_some())
    }

    /// Resolved level, `None` when the principal has no access at all
    pub fn permission_of<O: AccessSubject + ?Sized>(
        &self,
        principal: &Principal,
        object: &O,
    ) -> Result<Option<PermissionLevel>> {
        match object.baseline(principal) {
            Baseline::Granted(level) => Ok(Some(level)),
            Baseline::Denied => Ok(None),
            Baseline::ConsultShares => self.share_level(principal, object.share_target()),
            // items never nest, so one hop to the parent is the whole chain
            Baseline::Inherit => self.collection_permission(principal, object.share_target()),
        }
    }

    /// Full resolution for a collection
    pub fn collection_permission(
        &self,
        principal: &Principal,
        collection: &CollectionAccess,
    ) -> Result<Option<PermissionLevel>> {
        match collection.baseline(principal) {
            Baseline::Granted(level) => Ok(Some(level)),
            Baseline::ConsultShares => self.share_level(principal, collection),
            Baseline::Inherit | Baseline::Denied => Ok(None),
        }
    }

    fn share_level(
        &self,
        principal: &Principal,
        collection: &CollectionAccess,
    ) -> Result<Option<PermissionLevel>> {
        let Some(user) = principal.user_id() else {
            return Ok(None);
        };
        Ok(self
            .shares
            .lookup(&collection.id, user)?
            .map(PermissionLevel::from))
    }

    /// Decide one action on one object
    pub fn authorize<O: AccessSubject + ?Sized>(
        &self,
        principal: &Principal,
        object: &O,
        action: Action,
    ) -> Result<AccessDecision> {
        let level = self.permission_of(principal, object)?;

        let decision = match action {
            Action::Read => match level {
                Some(level) => AccessDecision::allow(action, level, "read access"),
                None => AccessDecision::deny(action, None, "no read access"),
            },
            Action::WriteUpdate | Action::WriteDelete => {
                self.authorize_write(principal, object, action, level)?
            }
            Action::ManageShares => match object.kind() {
                SubjectKind::Item => {
                    AccessDecision::deny(action, level, "shares attach only to collections")
                }
                SubjectKind::Collection if principal.is(object.owner()) => {
                    AccessDecision::allow(action, PermissionLevel::Owner, "collection owner")
                }
                SubjectKind::Collection => AccessDecision::deny(
                    action,
                    level,
                    "only the collection owner manages shares",
                ),
            },
        };

        if !decision.allowed {
            debug!(
                principal = %principal,
                kind = %object.kind(),
                object = object.id(),
                action = %action,
                reason = %decision.reason,
                "access denied"
            );
        }

        Ok(decision)
    }

    fn authorize_write<O: AccessSubject + ?Sized>(
        &self,
        principal: &Principal,
        object: &O,
        action: Action,
        level: Option<PermissionLevel>,
    ) -> Result<AccessDecision> {
        if principal.is(object.owner()) {
            return Ok(AccessDecision::allow(
                action,
                PermissionLevel::Owner,
                "object owner",
            ));
        }
        if level.is_none() {
            return Ok(AccessDecision::deny(action, None, "no read access"));
        }

        let decision = match object.kind() {
            SubjectKind::Item => {
                let parent = self.collection_permission(principal, object.share_target())?;
                match parent {
                    Some(parent) if parent.satisfies(PermissionLevel::Edit) => {
                        AccessDecision::allow(action, parent, "edit access on collection")
                    }
                    _ => AccessDecision::deny(
                        action,
                        parent,
                        "item writes need edit access on the collection",
                    ),
                }
            }
            SubjectKind::Collection => match level {
                Some(level) if level.satisfies(PermissionLevel::Manage) => {
                    AccessDecision::allow(action, level, "manage access")
                }
                _ => AccessDecision::deny(
                    action,
                    level,
                    "collection writes need manage access",
                ),
            },
        };

        Ok(decision)
    }

    /// [`authorize`](Self::authorize), with a deny turned into `Forbidden`
    pub fn require<O: AccessSubject + ?Sized>(
        &self,
        principal: &Principal,
        object: &O,
        action: Action,
    ) -> Result<AccessDecision> {
        self.authorize(principal, object, action)?.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{ShareLevel, ShareRegistry};

    fn alice() -> Principal {
        Principal::user("alice")
    }

    fn bob() -> Principal {
        Principal::user("bob")
    }

    fn collection(visibility: CollectionVisibility) -> CollectionAccess {
        CollectionAccess {
            id: CollectionId::from("c1"),
            owner: UserId::from("alice"),
            visibility,
        }
    }

    fn item(visibility: ItemVisibility, parent: CollectionAccess) -> ItemAccess {
        ItemAccess {
            id: ItemId::from("i1"),
            owner: UserId::from("alice"),
            visibility,
            collection: parent,
        }
    }

    fn grant(registry: &mut ShareRegistry, c: &CollectionAccess, who: &str, level: ShareLevel) {
        registry
            .upsert(&alice(), c, UserId::from(who), level)
            .unwrap();
    }

    #[test]
    fn test_owner_is_owner_everywhere() {
        let engine = AccessEngine::new(ShareRegistry::new());
        for visibility in [
            CollectionVisibility::Private,
            CollectionVisibility::Public,
            CollectionVisibility::Unlisted,
        ] {
            let c = collection(visibility);
            assert_eq!(
                engine.permission_of(&alice(), &c).unwrap(),
                Some(PermissionLevel::Owner)
            );
            assert!(engine.can_access(&alice(), &c).unwrap());
        }
    }

    #[test]
    fn test_private_collection_follows_shares() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();

        {
            let engine = AccessEngine::new(&registry);
            assert!(!engine.can_access(&bob(), &c1).unwrap());
            assert!(!engine.can_access(&Principal::Anonymous, &c1).unwrap());
        }

        grant(&mut registry, &c1, "bob", ShareLevel::Edit);
        let engine = AccessEngine::new(&registry);
        assert!(engine.can_access(&bob(), &c1).unwrap());
        assert_eq!(
            engine.permission_of(&bob(), &c1).unwrap(),
            Some(PermissionLevel::Edit)
        );
    }

    #[test]
    fn test_public_and_unlisted_resolve_to_view() {
        let mut registry = ShareRegistry::new();
        let public = collection(CollectionVisibility::Public);
        grant(&mut registry, &public, "bob", ShareLevel::Edit);
        let engine = AccessEngine::new(&registry);

        assert_eq!(
            engine.permission_of(&Principal::Anonymous, &public).unwrap(),
            Some(PermissionLevel::View)
        );
        // baseline wins over the stored edit share
        assert_eq!(
            engine.permission_of(&bob(), &public).unwrap(),
            Some(PermissionLevel::View)
        );

        let unlisted = collection(CollectionVisibility::Unlisted);
        assert!(engine.can_access(&Principal::Anonymous, &unlisted).unwrap());
    }

    #[test]
    fn test_public_item_in_private_collection() {
        let engine = AccessEngine::new(ShareRegistry::new());
        let i1 = item(
            ItemVisibility::Public,
            collection(CollectionVisibility::Private),
        );
        assert!(engine.can_access(&Principal::Anonymous, &i1).unwrap());
        assert_eq!(
            engine.permission_of(&Principal::Anonymous, &i1).unwrap(),
            Some(PermissionLevel::View)
        );
    }

    #[test]
    fn test_private_item_ignores_manage_share() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::Manage);
        let engine = AccessEngine::new(&registry);

        let private = item(ItemVisibility::Private, c1.clone());
        assert!(!engine.can_access(&bob(), &private).unwrap());
        assert_eq!(engine.permission_of(&bob(), &private).unwrap(), None);

        let decision = engine
            .authorize(&bob(), &private, Action::WriteUpdate)
            .unwrap();
        assert!(!decision.allowed);
    }

    #[test]
    fn test_collection_item_matches_parent() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::View);
        let engine = AccessEngine::new(&registry);
        let carol = Principal::user("carol");

        for parent in [
            c1.clone(),
            collection(CollectionVisibility::Public),
            collection(CollectionVisibility::Unlisted),
        ] {
            let inherited = item(ItemVisibility::Collection, parent.clone());
            for who in [&alice(), &bob(), &carol, &Principal::Anonymous] {
                assert_eq!(
                    engine.can_access(who, &inherited).unwrap(),
                    engine.can_access(who, &parent).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_item_writes_need_edit_on_parent() {
        let c1 = collection(CollectionVisibility::Private);
        let i1 = item(ItemVisibility::Collection, c1.clone());
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::View);
        grant(&mut registry, &c1, "carol", ShareLevel::Edit);
        let engine = AccessEngine::new(&registry);

        let viewer = engine.authorize(&bob(), &i1, Action::WriteUpdate).unwrap();
        assert!(!viewer.allowed);
        assert_eq!(viewer.level, Some(PermissionLevel::View));

        let editor = engine
            .authorize(&Principal::user("carol"), &i1, Action::WriteDelete)
            .unwrap();
        assert!(editor.allowed);
        assert_eq!(editor.level, Some(PermissionLevel::Edit));
    }

    #[test]
    fn test_collection_writes_need_manage() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::Edit);
        grant(&mut registry, &c1, "carol", ShareLevel::Manage);
        let engine = AccessEngine::new(&registry);

        assert!(!engine
            .authorize(&bob(), &c1, Action::WriteUpdate)
            .unwrap()
            .allowed);
        assert!(engine
            .authorize(&Principal::user("carol"), &c1, Action::WriteUpdate)
            .unwrap()
            .allowed);
        assert!(engine
            .authorize(&alice(), &c1, Action::WriteDelete)
            .unwrap()
            .allowed);
    }

    #[test]
    fn test_manage_shares_owner_only() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::Manage);
        let engine = AccessEngine::new(&registry);

        assert!(engine
            .authorize(&alice(), &c1, Action::ManageShares)
            .unwrap()
            .allowed);
        let denied = engine.require(&bob(), &c1, Action::ManageShares);
        assert!(matches!(denied, Err(HammerspaceError::Forbidden(_))));

        let i1 = item(ItemVisibility::Collection, c1);
        assert!(!engine
            .authorize(&alice(), &i1, Action::ManageShares)
            .unwrap()
            .allowed);
    }

    #[test]
    fn test_item_owner_writes_own_item() {
        let c1 = collection(CollectionVisibility::Private);
        let mut registry = ShareRegistry::new();
        grant(&mut registry, &c1, "bob", ShareLevel::View);
        let engine = AccessEngine::new(&registry);

        let bobs_item = ItemAccess {
            id: ItemId::from("i2"),
            owner: UserId::from("bob"),
            visibility: ItemVisibility::Collection,
            collection: c1,
        };
        let decision = engine
            .authorize(&bob(), &bobs_item, Action::WriteDelete)
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.level, Some(PermissionLevel::Owner));
    }

    #[test]
    fn test_anonymous_cannot_write_public() {
        let engine = AccessEngine::new(ShareRegistry::new());
        let public = collection(CollectionVisibility::Public);
        let decision = engine
            .authorize(&Principal::Anonymous, &public, Action::WriteUpdate)
            .unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.level, Some(PermissionLevel::View));

        let read = engine
            .authorize(&Principal::Anonymous, &public, Action::Read)
            .unwrap();
        assert!(read.allowed);
    }
}
