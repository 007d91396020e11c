//! Share registry: explicit (collection, grantee, level) grants
//!
//! At most one grant exists per (collection, grantee). Granting again
//! overwrites the level. Only the collection owner may grant, list or revoke,
//! whatever level another caller holds on the collection.
//!
//! [`ShareLookup`] is the read seam the engine uses; the SQLite store
//! implements it in `db::shares`, [`ShareRegistry`] implements it in memory.

use std::collections::HashMap;

use tracing::debug;

use super::engine::CollectionAccess;
use super::identity::{Principal, UserId};
use super::permission::ShareLevel;
use crate::error::{HammerspaceError, Result};
use crate::models::CollectionId;

/// Read access to stored grants
pub trait ShareLookup {
    /// Level granted to `grantee` on `collection`, if any
    fn lookup(&self, collection: &CollectionId, grantee: &UserId) -> Result<Option<ShareLevel>>;
}

impl<T: ShareLookup + ?Sized> ShareLookup for &T {
    fn lookup(&self, collection: &CollectionId, grantee: &UserId) -> Result<Option<ShareLevel>> {
        (**self).lookup(collection, grantee)
    }
}

/// Gate every share mutation or listing goes through.
///
/// `grantee` is checked only when a grant is being written.
pub fn check_share_mutation(
    actor: &Principal,
    collection: &CollectionAccess,
    grantee: Option<&UserId>,
) -> Result<()> {
    let actor_id = actor.user_id().ok_or_else(|| {
        HammerspaceError::Auth("managing shares requires an authenticated user".into())
    })?;

    if actor_id != &collection.owner {
        debug!(
            principal = %actor,
            collection = %collection.id,
            "share management refused: not the collection owner"
        );
        return Err(HammerspaceError::Forbidden(format!(
            "only the owner of collection {} can manage its shares",
            collection.id
        )));
    }

    match grantee {
        Some(grantee) => reject_self_share(collection, grantee),
        None => Ok(()),
    }
}

/// The owner already holds `owner`; a share on top of it is rejected
pub fn reject_self_share(collection: &CollectionAccess, grantee: &UserId) -> Result<()> {
    if grantee == &collection.owner {
        return Err(HammerspaceError::InvalidGrant(
            "a collection cannot be shared with its owner".into(),
        ));
    }
    Ok(())
}

/// In-memory share registry
#[derive(Debug, Default, Clone)]
pub struct ShareRegistry {
    grants: HashMap<(CollectionId, UserId), ShareLevel>,
}

impl ShareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a grant. Returns `true` when a new grant was created.
    pub fn upsert(
        &mut self,
        actor: &Principal,
        collection: &CollectionAccess,
        grantee: UserId,
        level: ShareLevel,
    ) -> Result<bool> {
        check_share_mutation(actor, collection, Some(&grantee))?;
        let previous = self.grants.insert((collection.id.clone(), grantee), level);
        Ok(previous.is_none())
    }

    /// Remove a grant. Returns `true` when one existed.
    pub fn revoke(
        &mut self,
        actor: &Principal,
        collection: &CollectionAccess,
        grantee: &UserId,
    ) -> Result<bool> {
        check_share_mutation(actor, collection, None)?;
        Ok(self
            .grants
            .remove(&(collection.id.clone(), grantee.clone()))
            .is_some())
    }

    /// Grants on one collection, sorted by grantee
    pub fn list(
        &self,
        actor: &Principal,
        collection: &CollectionAccess,
    ) -> Result<Vec<(UserId, ShareLevel)>> {
        check_share_mutation(actor, collection, None)?;
        let mut grants: Vec<_> = self
            .grants
            .iter()
            .filter(|((id, _), _)| id == &collection.id)
            .map(|((_, grantee), level)| (grantee.clone(), *level))
            .collect();
        grants.sort();
        Ok(grants)
    }

    /// Drop every grant of a deleted collection
    pub fn remove_collection(&mut self, collection: &CollectionId) -> usize {
        let before = self.grants.len();
        self.grants.retain(|(id, _), _| id != collection);
        before - self.grants.len()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl ShareLookup for ShareRegistry {
    fn lookup(&self, collection: &CollectionId, grantee: &UserId) -> Result<Option<ShareLevel>> {
        Ok(self
            .grants
            .get(&(collection.clone(), grantee.clone()))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CollectionVisibility;

    fn c1() -> CollectionAccess {
        CollectionAccess {
            id: CollectionId::from("c1"),
            owner: UserId::from("alice"),
            visibility: CollectionVisibility::Private,
        }
    }

    fn alice() -> Principal {
        Principal::user("alice")
    }

    #[test]
    fn test_second_grant_overwrites() {
        let mut registry = ShareRegistry::new();
        let bob = UserId::from("bob");

        assert!(registry
            .upsert(&alice(), &c1(), bob.clone(), ShareLevel::View)
            .unwrap());
        assert!(!registry
            .upsert(&alice(), &c1(), bob.clone(), ShareLevel::Manage)
            .unwrap());

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup(&c1().id, &bob).unwrap(),
            Some(ShareLevel::Manage)
        );
    }

    #[test]
    fn test_only_owner_mutates() {
        let mut registry = ShareRegistry::new();
        registry
            .upsert(&alice(), &c1(), UserId::from("bob"), ShareLevel::Manage)
            .unwrap();

        // a manage grantee still cannot touch shares
        let result = registry.upsert(
            &Principal::user("bob"),
            &c1(),
            UserId::from("carol"),
            ShareLevel::View,
        );
        assert!(matches!(result, Err(HammerspaceError::Forbidden(_))));

        let result = registry.revoke(&Principal::user("bob"), &c1(), &UserId::from("bob"));
        assert!(matches!(result, Err(HammerspaceError::Forbidden(_))));

        let result = registry.list(&Principal::Anonymous, &c1());
        assert!(matches!(result, Err(HammerspaceError::Auth(_))));
    }

    #[test]
    fn test_self_share_rejected() {
        let mut registry = ShareRegistry::new();
        let result = registry.upsert(&alice(), &c1(), UserId::from("alice"), ShareLevel::Edit);
        assert!(matches!(result, Err(HammerspaceError::InvalidGrant(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_revoke_and_cascade() {
        let mut registry = ShareRegistry::new();
        registry
            .upsert(&alice(), &c1(), UserId::from("bob"), ShareLevel::Edit)
            .unwrap();
        registry
            .upsert(&alice(), &c1(), UserId::from("carol"), ShareLevel::View)
            .unwrap();

        assert_eq!(
            registry.list(&alice(), &c1()).unwrap(),
            vec![
                (UserId::from("bob"), ShareLevel::Edit),
                (UserId::from("carol"), ShareLevel::View),
            ]
        );

        assert!(registry.revoke(&alice(), &c1(), &UserId::from("bob")).unwrap());
        assert!(!registry.revoke(&alice(), &c1(), &UserId::from("bob")).unwrap());
        assert_eq!(registry.remove_collection(&c1().id), 1);
        assert!(registry.is_empty());
    }
}
