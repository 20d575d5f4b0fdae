//! Identities of callers and the identity-mapping collaborator.
//!
//! ACL entries name users and groups by composite identity ([`Fuid`]);
//! callers present local numeric ids. The [`IdentityMapper`] trait converts
//! between the two and answers group membership questions. Mapping
//! failures are reported as [`MappingUnavailable`] and treated by the
//! evaluator as a non-matching entry.

use dashmap::DashMap;
use protocol::acl::{Fuid, is_ephemeral};
use rustc_hash::FxBuildHasher;

pub use protocol::acl::IdType;

/// Security context of the caller requesting an access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    uid: u32,
    gid: u32,
    groups: Vec<u32>,
}

impl Credential {
    /// Creates a credential with a primary group and no supplementary groups.
    #[must_use]
    pub const fn new(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            gid,
            groups: Vec::new(),
        }
    }

    /// Replaces the supplementary group list.
    #[must_use]
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = u32>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    /// Returns the user id.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// Returns the primary group id.
    #[must_use]
    pub const fn gid(&self) -> u32 {
        self.gid
    }

    /// Returns the supplementary group ids.
    #[must_use]
    pub fn groups(&self) -> &[u32] {
        &self.groups
    }

    /// Reports whether the caller belongs to `gid`.
    #[must_use]
    pub fn in_group(&self, gid: u32) -> bool {
        self.gid == gid || self.groups.contains(&gid)
    }
}

/// The identity-mapping collaborator could not resolve an identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no {kind:?} mapping for {id:#x}")]
pub struct MappingUnavailable {
    /// Identity that failed to resolve, local or composite.
    pub id: u64,
    /// Whether a user or a group was being resolved.
    pub kind: IdType,
}

impl MappingUnavailable {
    /// Creates the error for an identity.
    #[must_use]
    pub const fn new(id: u64, kind: IdType) -> Self {
        Self { id, kind }
    }
}

/// Converts between local ids and composite identities.
///
/// Implementations must be callable from many threads at once.
pub trait IdentityMapper: Send + Sync {
    /// Maps a local id to the composite identity stored in ACL entries.
    fn local_to_composite(&self, id: u32, kind: IdType) -> Result<Fuid, MappingUnavailable>;

    /// Maps a composite identity back to a local id.
    fn composite_to_local(&self, fuid: Fuid, kind: IdType) -> Result<u32, MappingUnavailable>;

    /// Reports whether `cred` is a member of the group named by `group`.
    fn is_member(&self, cred: &Credential, group: Fuid) -> Result<bool, MappingUnavailable> {
        let gid = self.composite_to_local(group, IdType::Group)?;
        Ok(cred.in_group(gid))
    }
}

impl<T: IdentityMapper + ?Sized> IdentityMapper for &T {
    fn local_to_composite(&self, id: u32, kind: IdType) -> Result<Fuid, MappingUnavailable> {
        (**self).local_to_composite(id, kind)
    }

    fn composite_to_local(&self, fuid: Fuid, kind: IdType) -> Result<u32, MappingUnavailable> {
        (**self).composite_to_local(fuid, kind)
    }

    fn is_member(&self, cred: &Credential, group: Fuid) -> Result<bool, MappingUnavailable> {
        (**self).is_member(cred, group)
    }
}

/// Mapper for filesystems that only ever see local ids.
///
/// Every local id maps to the composite identity with domain index zero;
/// identities from any other domain are unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalIdentityMapper;

impl IdentityMapper for LocalIdentityMapper {
    fn local_to_composite(&self, id: u32, _kind: IdType) -> Result<Fuid, MappingUnavailable> {
        Ok(Fuid::local(id))
    }

    fn composite_to_local(&self, fuid: Fuid, kind: IdType) -> Result<u32, MappingUnavailable> {
        if fuid.is_local() {
            Ok(fuid.rid())
        } else {
            Err(MappingUnavailable::new(fuid.as_raw(), kind))
        }
    }
}

/// Mapper backed by a table of domain identities.
///
/// Non-ephemeral local ids map to themselves. Ephemeral ids and composite
/// identities outside the local domain resolve through registered pairs.
#[derive(Debug, Default)]
pub struct DomainIdentityMapper {
    forward: DashMap<(IdType, u32), Fuid, FxBuildHasher>,
    reverse: DashMap<(IdType, u64), u32, FxBuildHasher>,
}

impl DomainIdentityMapper {
    /// Creates an empty mapper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the ephemeral local `id` stands for `fuid`.
    pub fn register(&self, id: u32, kind: IdType, fuid: Fuid) {
        self.forward.insert((kind, id), fuid);
        self.reverse.insert((kind, fuid.as_raw()), id);
    }

    /// Forgets the pair registered for `id`.
    ///
    /// Returns the composite identity it mapped to.
    pub fn unregister(&self, id: u32, kind: IdType) -> Option<Fuid> {
        let (_, fuid) = self.forward.remove(&(kind, id))?;
        self.reverse.remove(&(kind, fuid.as_raw()));
        Some(fuid)
    }

    /// Returns the number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Reports whether no pair is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl IdentityMapper for DomainIdentityMapper {
    fn local_to_composite(&self, id: u32, kind: IdType) -> Result<Fuid, MappingUnavailable> {
        if !is_ephemeral(id) {
            return Ok(Fuid::local(id));
        }
        self.forward
            .get(&(kind, id))
            .map(|entry| *entry.value())
            .ok_or_else(|| MappingUnavailable::new(u64::from(id), kind))
    }

    fn composite_to_local(&self, fuid: Fuid, kind: IdType) -> Result<u32, MappingUnavailable> {
        if fuid.is_local() && !is_ephemeral(fuid.rid()) {
            return Ok(fuid.rid());
        }
        self.reverse
            .get(&(kind, fuid.as_raw()))
            .map(|entry| *entry.value())
            .ok_or_else(|| MappingUnavailable::new(fuid.as_raw(), kind))
    }
}
