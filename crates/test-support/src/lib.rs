#![deny(unsafe_code)]

//! Fixtures shared by the aclfs integration tests.
//!
//! [`StaticIdentityMap`] is a deterministic identity mapper whose tables
//! are fixed when the test builds it, including an outage switch for
//! exercising the mapping-failure paths. The free functions build
//! credentials, entries and managers with the defaults most tests want.

use std::sync::Arc;

use metadata::{
    AclManager, AclOptions, Credential, IdType, IdentityMapper, MappingUnavailable, MemoryStore,
    PrivilegePolicy,
};
use protocol::acl::{Ace, AceType, Fuid};
use rustc_hash::{FxHashMap, FxHashSet};

/// Identity mapper backed by fixed tables.
///
/// Ids without an entry map to the local domain, as a filesystem without
/// domain identities would. Registered pairs take precedence in both
/// directions. Explicit memberships replace the credential's own group list
/// for the groups they name.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentityMap {
    forward: FxHashMap<(IdType, u32), Fuid>,
    reverse: FxHashMap<(IdType, u64), u32>,
    members: FxHashMap<u64, FxHashSet<u32>>,
    unavailable: bool,
}

impl StaticIdentityMap {
    /// Creates a mapper with empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps local user `uid` to `fuid`.
    #[must_use]
    pub fn user(mut self, uid: u32, fuid: Fuid) -> Self {
        self.forward.insert((IdType::User, uid), fuid);
        self.reverse.insert((IdType::User, fuid.as_raw()), uid);
        self
    }

    /// Maps local group `gid` to `fuid`.
    #[must_use]
    pub fn group(mut self, gid: u32, fuid: Fuid) -> Self {
        self.forward.insert((IdType::Group, gid), fuid);
        self.reverse.insert((IdType::Group, fuid.as_raw()), gid);
        self
    }

    /// Records `uid` as a member of `group`.
    #[must_use]
    pub fn member(mut self, uid: u32, group: Fuid) -> Self {
        self.members.entry(group.as_raw()).or_default().insert(uid);
        self
    }

    /// Makes every lookup fail.
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

impl IdentityMapper for StaticIdentityMap {
    fn local_to_composite(&self, id: u32, kind: IdType) -> Result<Fuid, MappingUnavailable> {
        if self.unavailable {
            return Err(MappingUnavailable::new(u64::from(id), kind));
        }
        Ok(self
            .forward
            .get(&(kind, id))
            .copied()
            .unwrap_or_else(|| Fuid::local(id)))
    }

    fn composite_to_local(&self, fuid: Fuid, kind: IdType) -> Result<u32, MappingUnavailable> {
        if self.unavailable {
            return Err(MappingUnavailable::new(fuid.as_raw(), kind));
        }
        if let Some(&id) = self.reverse.get(&(kind, fuid.as_raw())) {
            return Ok(id);
        }
        if fuid.is_local() {
            Ok(fuid.rid())
        } else {
            Err(MappingUnavailable::new(fuid.as_raw(), kind))
        }
    }

    fn is_member(&self, cred: &Credential, group: Fuid) -> Result<bool, MappingUnavailable> {
        if let Some(members) = self.members.get(&group.as_raw()) {
            return Ok(members.contains(&cred.uid()));
        }
        let gid = self.composite_to_local(group, IdType::Group)?;
        Ok(cred.in_group(gid))
    }
}

/// Credential with a primary group and no supplementary groups.
#[must_use]
pub const fn cred(uid: u32, gid: u32) -> Credential {
    Credential::new(uid, gid)
}

/// Credential with supplementary groups.
#[must_use]
pub fn cred_in(uid: u32, gid: u32, groups: &[u32]) -> Credential {
    Credential::new(uid, gid).with_groups(groups.iter().copied())
}

/// `owner@` ALLOW entry.
#[must_use]
pub fn allow_owner(mask: u32) -> Ace {
    Ace::owner(AceType::Allow, mask)
}

/// `owner@` DENY entry.
#[must_use]
pub fn deny_owner(mask: u32) -> Ace {
    Ace::owner(AceType::Deny, mask)
}

/// `group@` ALLOW entry.
#[must_use]
pub fn allow_owning_group(mask: u32) -> Ace {
    Ace::owning_group(AceType::Allow, mask)
}

/// `group@` DENY entry.
#[must_use]
pub fn deny_owning_group(mask: u32) -> Ace {
    Ace::owning_group(AceType::Deny, mask)
}

/// `everyone@` ALLOW entry.
#[must_use]
pub fn allow_everyone(mask: u32) -> Ace {
    Ace::everyone(AceType::Allow, mask)
}

/// `everyone@` DENY entry.
#[must_use]
pub fn deny_everyone(mask: u32) -> Ace {
    Ace::everyone(AceType::Deny, mask)
}

/// ALLOW entry for a local user id.
#[must_use]
pub fn allow_user(uid: u32, mask: u32) -> Ace {
    Ace::user(AceType::Allow, u64::from(uid), mask)
}

/// DENY entry for a local user id.
#[must_use]
pub fn deny_user(uid: u32, mask: u32) -> Ace {
    Ace::user(AceType::Deny, u64::from(uid), mask)
}

/// ALLOW entry for a local group id.
#[must_use]
pub fn allow_group(gid: u32, mask: u32) -> Ace {
    Ace::group(AceType::Allow, u64::from(gid), mask)
}

/// DENY entry for a local group id.
#[must_use]
pub fn deny_group(gid: u32, mask: u32) -> Ace {
    Ace::group(AceType::Deny, u64::from(gid), mask)
}

/// Manager over a fresh shared in-memory store.
///
/// The store is returned as well so a test can build a second manager
/// with another policy over the same objects.
pub fn memory_manager<M, P>(
    mapper: M,
    policy: P,
    options: AclOptions,
) -> (Arc<MemoryStore>, AclManager<Arc<MemoryStore>, M, P>)
where
    M: IdentityMapper,
    P: PrivilegePolicy,
{
    let store = Arc::new(MemoryStore::new());
    let manager = AclManager::new(Arc::clone(&store), mapper, policy, options);
    (store, manager)
}
