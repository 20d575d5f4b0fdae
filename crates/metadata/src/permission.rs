//! Permission decisions on stored objects.
//!
//! [`PermissionChecker`] combines the object attributes that forbid an
//! access outright, the ACL verdict of [`crate::access::check`] and a
//! [`PrivilegePolicy`] that may override bits the ACL left unresolved or
//! denied. Deletion and rename follow the NFSv4 delete table: permission
//! can come from DELETE_CHILD on the directory, DELETE on the target, or
//! write and search access to the directory.

use logging::{debug_log, warn_log};
use protocol::acl::{
    ACE_ADD_FILE, ACE_ADD_SUBDIRECTORY, ACE_ALL_PERMS, ACE_APPEND_DATA, ACE_DELETE,
    ACE_DELETE_CHILD, ACE_EXECUTE, ACE_READ_ACL, ACE_READ_ATTRIBUTES, ACE_READ_DATA,
    ACE_READ_NAMED_ATTRS, ACE_SYNCHRONIZE, ACE_WRITE_ACL, ACE_WRITE_ATTRIBUTES, ACE_WRITE_DATA,
    ACE_WRITE_NAMED_ATTRS, ACE_WRITE_OWNER, Fuid, IdType, UID_NOBODY,
};

use crate::access::{AccessOutcome, AccessRequest, CheckMode, check};
use crate::acl::Acl;
use crate::error::MetadataError;
use crate::flags::ObjectFlags;
use crate::mode::{S_ISVTX, S_IXGRP, S_IXOTH, S_IXUSR, unix_to_v4};
use crate::options::AclOptions;
use crate::ownership::{Credential, IdentityMapper};
use crate::store::ObjectAttrs;

/// Legacy read permission bit.
pub const VREAD: u32 = 0o4;
/// Legacy write permission bit.
pub const VWRITE: u32 = 0o2;
/// Legacy execute/search permission bit.
pub const VEXEC: u32 = 0o1;

/// Bits that modify file data.
pub const WRITE_MASK_DATA: u32 = ACE_WRITE_DATA | ACE_APPEND_DATA | ACE_WRITE_NAMED_ATTRS;
/// Bits that modify attributes or the namespace.
pub const WRITE_MASK_ATTRS: u32 =
    ACE_WRITE_ACL | ACE_WRITE_OWNER | ACE_WRITE_ATTRIBUTES | ACE_DELETE | ACE_DELETE_CHILD;
/// Every modifying bit.
pub const WRITE_MASK: u32 = WRITE_MASK_DATA | WRITE_MASK_ATTRS;

/// Bits the privilege fallback knows how to grant.
pub const CHECKED_MASKS: u32 = ACE_READ_ACL
    | ACE_READ_ATTRIBUTES
    | ACE_READ_DATA
    | ACE_READ_NAMED_ATTRS
    | ACE_WRITE_DATA
    | ACE_WRITE_ATTRIBUTES
    | ACE_WRITE_NAMED_ATTRS
    | ACE_APPEND_DATA
    | ACE_EXECUTE
    | ACE_WRITE_OWNER
    | ACE_WRITE_ACL
    | ACE_DELETE
    | ACE_DELETE_CHILD
    | ACE_SYNCHRONIZE;

const OWNER_IMPLICIT: u32 = ACE_READ_ACL | ACE_READ_ATTRIBUTES;

/// Privilege collaborator consulted when the ACL alone refuses an access.
///
/// The provided methods implement an unprivileged caller: owners may
/// change ownership and the ACL of their own objects, nothing else is
/// overridden.
pub trait PrivilegePolicy: Send + Sync {
    /// Grants the legacy `missing` bits (`VREAD`, `VWRITE`, `VEXEC`) on an
    /// object owned by `owner`.
    fn vnode_access(
        &self,
        cred: &Credential,
        owner: u32,
        missing: u32,
    ) -> Result<(), MetadataError> {
        let _ = (cred, owner, missing);
        Err(MetadataError::AccessDenied)
    }

    /// Allows changing the owner of an object owned by `owner`.
    fn chown(&self, cred: &Credential, owner: u32) -> Result<(), MetadataError> {
        if cred.uid() == owner {
            Ok(())
        } else {
            Err(MetadataError::NotPermitted)
        }
    }

    /// Allows changing the ACL or mode of an object owned by `owner`.
    fn setdac(&self, cred: &Credential, owner: u32) -> Result<(), MetadataError> {
        if cred.uid() == owner {
            Ok(())
        } else {
            Err(MetadataError::NotPermitted)
        }
    }

    /// Allows removing a directory entry the ACL does not permit removing.
    fn remove(&self, cred: &Credential) -> Result<(), MetadataError> {
        let _ = cred;
        Err(MetadataError::AccessDenied)
    }

    /// Reports whether the caller has some access to an object owned by
    /// `owner` regardless of its ACL.
    fn any_access(&self, cred: &Credential, owner: u32) -> bool {
        cred.uid() == owner
    }

    /// Reports whether the caller may create objects in a group it does not
    /// belong to.
    fn create_gid(&self, cred: &Credential) -> bool {
        let _ = cred;
        false
    }

    /// Reports whether a new object in group `gid` may keep its set-gid bit.
    fn setid_setgid(&self, cred: &Credential, gid: u32) -> bool {
        cred.in_group(gid)
    }
}

impl<T: PrivilegePolicy + ?Sized> PrivilegePolicy for &T {
    fn vnode_access(
        &self,
        cred: &Credential,
        owner: u32,
        missing: u32,
    ) -> Result<(), MetadataError> {
        (**self).vnode_access(cred, owner, missing)
    }

    fn chown(&self, cred: &Credential, owner: u32) -> Result<(), MetadataError> {
        (**self).chown(cred, owner)
    }

    fn setdac(&self, cred: &Credential, owner: u32) -> Result<(), MetadataError> {
        (**self).setdac(cred, owner)
    }

    fn remove(&self, cred: &Credential) -> Result<(), MetadataError> {
        (**self).remove(cred)
    }

    fn any_access(&self, cred: &Credential, owner: u32) -> bool {
        (**self).any_access(cred, owner)
    }

    fn create_gid(&self, cred: &Credential) -> bool {
        (**self).create_gid(cred)
    }

    fn setid_setgid(&self, cred: &Credential, gid: u32) -> bool {
        (**self).setid_setgid(cred, gid)
    }
}

/// Policy of an ordinary caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unprivileged;

impl PrivilegePolicy for Unprivileged {}

/// Policy of a caller holding every file privilege.
#[derive(Clone, Copy, Debug, Default)]
pub struct Superuser;

impl PrivilegePolicy for Superuser {
    fn vnode_access(&self, _: &Credential, _: u32, _: u32) -> Result<(), MetadataError> {
        Ok(())
    }

    fn chown(&self, _: &Credential, _: u32) -> Result<(), MetadataError> {
        Ok(())
    }

    fn setdac(&self, _: &Credential, _: u32) -> Result<(), MetadataError> {
        Ok(())
    }

    fn remove(&self, _: &Credential) -> Result<(), MetadataError> {
        Ok(())
    }

    fn any_access(&self, _: &Credential, _: u32) -> bool {
        true
    }

    fn create_gid(&self, _: &Credential) -> bool {
        true
    }

    fn setid_setgid(&self, _: &Credential, _: u32) -> bool {
        true
    }
}

/// An object as seen by a permission decision.
#[derive(Clone, Copy, Debug)]
pub struct Subject<'a> {
    /// Attributes of the object.
    pub attrs: &'a ObjectAttrs,
    /// Its ACL with masks computed.
    pub acl: &'a Acl,
    /// For an extended-attribute directory, the object it belongs to.
    pub base: Option<&'a Subject<'a>>,
}

impl<'a> Subject<'a> {
    /// Pairs attributes with an ACL.
    #[must_use]
    pub const fn new(attrs: &'a ObjectAttrs, acl: &'a Acl) -> Self {
        Self {
            attrs,
            acl,
            base: None,
        }
    }

    /// Attaches the object an extended-attribute directory belongs to.
    #[must_use]
    pub const fn with_base(mut self, base: &'a Subject<'a>) -> Self {
        self.base = Some(base);
        self
    }

    /// Reports whether the object is an extended-attribute directory.
    #[must_use]
    pub const fn is_xattr_dir(&self) -> bool {
        self.attrs.pflags.contains(ObjectFlags::XATTR) && self.attrs.is_dir()
    }
}

/// Checks the filesystem and object attributes that refuse an access
/// regardless of the ACL.
pub fn dataset_check(
    options: &AclOptions,
    attrs: &ObjectAttrs,
    requested: u32,
) -> Result<(), MetadataError> {
    if requested & WRITE_MASK != 0 && options.is_read_only() {
        return Err(MetadataError::ReadOnlyFilesystem);
    }

    let data_locked = if attrs.is_dir() {
        attrs.pflags.contains(ObjectFlags::IMMUTABLE)
    } else {
        attrs
            .pflags
            .contains(ObjectFlags::READONLY | ObjectFlags::IMMUTABLE)
    };
    if requested & WRITE_MASK_DATA != 0 && data_locked {
        return Err(MetadataError::NotPermitted);
    }

    if requested & (ACE_DELETE | ACE_DELETE_CHILD) != 0
        && attrs.pflags.contains(ObjectFlags::NOUNLINK)
    {
        return Err(MetadataError::NotPermitted);
    }

    if requested & (ACE_READ_DATA | ACE_EXECUTE) != 0
        && attrs.pflags.contains(ObjectFlags::AV_QUARANTINED)
    {
        return Err(MetadataError::AccessDenied);
    }

    Ok(())
}

/// Why the attribute and ACL stage refused an access.
#[derive(Debug)]
enum Refusal {
    /// An attribute refused; privileges do not apply.
    Attribute(MetadataError),
    /// Some bits were explicitly denied.
    Denied(u32),
    /// Some bits were never granted.
    Unresolved(u32),
}

impl Refusal {
    const fn working(&self) -> Option<u32> {
        match self {
            Self::Attribute(_) => None,
            Self::Denied(bits) | Self::Unresolved(bits) => Some(*bits),
        }
    }

    fn into_error(self) -> MetadataError {
        match self {
            Self::Attribute(err) => err,
            Self::Denied(_) | Self::Unresolved(_) => MetadataError::AccessDenied,
        }
    }
}

const fn legacy_bits(working: u32) -> u32 {
    let mut bits = 0;
    if working & (ACE_READ_DATA | ACE_READ_NAMED_ATTRS | OWNER_IMPLICIT | ACE_SYNCHRONIZE) != 0 {
        bits |= VREAD;
    }
    if working
        & (ACE_WRITE_DATA
            | ACE_WRITE_NAMED_ATTRS
            | ACE_APPEND_DATA
            | ACE_WRITE_ATTRIBUTES
            | ACE_SYNCHRONIZE)
        != 0
    {
        bits |= VWRITE;
    }
    if working & ACE_EXECUTE != 0 {
        bits |= VEXEC;
    }
    bits
}

const fn xattr_request(mut requested: u32) -> u32 {
    if requested & (ACE_WRITE_DATA | ACE_APPEND_DATA) != 0 {
        requested &= !(ACE_WRITE_DATA | ACE_APPEND_DATA);
        requested |= ACE_WRITE_NAMED_ATTRS;
    }
    if requested & (ACE_READ_DATA | ACE_EXECUTE) != 0 {
        requested &= !(ACE_READ_DATA | ACE_EXECUTE);
        requested |= ACE_READ_NAMED_ATTRS;
    }
    requested
}

/// Object whose attributes and ACL decide a request on `subject`.
fn redirect<'s, 'a>(
    subject: &'s Subject<'a>,
    requested: u32,
) -> Result<(&'s Subject<'a>, u32), MetadataError> {
    if !subject.is_xattr_dir() {
        return Ok((subject, requested));
    }
    let base = subject.base.ok_or(MetadataError::Unsupported(
        "attribute directory checked without its object",
    ))?;
    Ok((base, xattr_request(requested)))
}

/// Makes permission decisions for one filesystem.
pub struct PermissionChecker<'a> {
    options: &'a AclOptions,
    mapper: &'a dyn IdentityMapper,
    policy: &'a dyn PrivilegePolicy,
}

impl std::fmt::Debug for PermissionChecker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionChecker")
            .field("options", self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> PermissionChecker<'a> {
    /// Creates a checker.
    #[must_use]
    pub fn new(
        options: &'a AclOptions,
        mapper: &'a dyn IdentityMapper,
        policy: &'a dyn PrivilegePolicy,
    ) -> Self {
        Self {
            options,
            mapper,
            policy,
        }
    }

    fn local_id(&self, fuid: Fuid, kind: IdType) -> u32 {
        self.mapper.composite_to_local(fuid, kind).unwrap_or_else(|err| {
            warn_log!(Idmap, "mapping {kind:?} {:#x} for permission check: {err}", fuid.as_raw());
            UID_NOBODY
        })
    }

    fn request<'r>(&'r self, subject: &Subject<'_>, cred: &'r Credential) -> AccessRequest<'r> {
        AccessRequest {
            cred,
            mapper: self.mapper,
            owner: subject.attrs.owner,
            group: subject.attrs.group,
            is_dir: subject.attrs.is_dir(),
        }
    }

    fn evaluate(
        &self,
        subject: &Subject<'_>,
        requested: u32,
        mode: CheckMode,
        cred: &Credential,
    ) -> AccessOutcome {
        check(subject.acl, &self.request(subject, cred), requested, mode)
    }

    fn common(
        &self,
        subject: &Subject<'_>,
        requested: u32,
        cred: &Credential,
    ) -> Result<(), Refusal> {
        if requested == 0 || self.options.is_replay() {
            return Ok(());
        }
        dataset_check(self.options, subject.attrs, requested).map_err(Refusal::Attribute)?;
        match self.evaluate(subject, requested, CheckMode::AllDenied, cred) {
            AccessOutcome::Granted | AccessOutcome::AnyAllowed => Ok(()),
            AccessOutcome::Denied(bits) => Err(Refusal::Denied(bits)),
            AccessOutcome::Unresolved(bits) => Err(Refusal::Unresolved(bits)),
        }
    }

    fn retry_append(
        &self,
        subject: &Subject<'_>,
        working: u32,
        cred: &Credential,
    ) -> Result<(), Refusal> {
        if working != ACE_WRITE_DATA {
            return Err(Refusal::Denied(working));
        }
        self.common(subject, ACE_APPEND_DATA, cred)
    }

    fn legacy_access(
        &self,
        cred: &Credential,
        owner: u32,
        current: u32,
        wanted: u32,
    ) -> Result<(), MetadataError> {
        let missing = wanted & !current;
        if missing == 0 {
            return Ok(());
        }
        self.policy.vnode_access(cred, owner, missing)
    }

    /// Runs only the attribute checks for `requested` on `subject`,
    /// without evaluating its ACL.
    ///
    /// # Errors
    ///
    /// Whatever [`dataset_check`] refuses on the checked object.
    pub fn attribute_check(
        &self,
        subject: &Subject<'_>,
        requested: u32,
    ) -> Result<(), MetadataError> {
        let (target, requested) = redirect(subject, requested)?;
        if requested == 0 || self.options.is_replay() {
            return Ok(());
        }
        dataset_check(self.options, target.attrs, requested)
    }

    /// Decides whether `cred` may perform the `requested` access on
    /// `subject`.
    ///
    /// Extended-attribute directories are checked against the object they
    /// belong to, with data bits translated to named-attribute bits.
    /// `append` retries a refused WRITE_DATA request as APPEND_DATA.
    pub fn access(
        &self,
        subject: &Subject<'_>,
        requested: u32,
        append: bool,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let (target, requested) = redirect(subject, requested)?;

        let owner = self.local_id(subject.attrs.owner, IdType::User);
        let mut stripped = requested;
        if owner == cred.uid() {
            stripped &= !OWNER_IMPLICIT;
        }
        let needed = legacy_bits(stripped);

        let mut result = self.common(target, requested, cred);
        if append {
            if let Err(refusal) = &result {
                if let Some(working) = refusal.working() {
                    result = self.retry_append(subject, working, cred);
                }
            }
        }

        let refusal = match result {
            Ok(()) => return Ok(()),
            Err(refusal) => refusal,
        };
        let Some(mut working) = refusal.working() else {
            return Err(refusal.into_error());
        };

        if owner == cred.uid() {
            working &= !OWNER_IMPLICIT;
        }
        let checkmode = legacy_bits(working);
        debug_log!(
            Access,
            1,
            "uid {} lacks {working:#x} on owner {owner}'s object, consulting privileges",
            cred.uid()
        );

        self.legacy_access(cred, owner, needed & !checkmode, needed)?;
        if working & ACE_WRITE_OWNER != 0 {
            self.policy.chown(cred, owner)?;
        }
        if working & ACE_WRITE_ACL != 0 {
            self.policy.setdac(cred, owner)?;
        }
        if working & (ACE_DELETE | ACE_DELETE_CHILD) != 0 {
            self.policy.remove(cred)?;
        }
        if working & ACE_SYNCHRONIZE != 0 {
            self.policy.chown(cred, owner)?;
        }
        if working & !CHECKED_MASKS != 0 {
            return Err(MetadataError::AccessDenied);
        }
        Ok(())
    }

    /// Checks a legacy `rwx` request given as mode bits in the owner
    /// position (`0o700` style).
    pub fn access_rwx(
        &self,
        subject: &Subject<'_>,
        mode: u32,
        append: bool,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        self.access(subject, unix_to_v4(mode >> 6), append, cred)
    }

    /// Reports whether `cred` has any access at all to `subject`.
    #[must_use]
    pub fn has_access(&self, subject: &Subject<'_>, cred: &Credential) -> bool {
        if self
            .evaluate(subject, ACE_ALL_PERMS, CheckMode::AnyAllowed, cred)
            .is_granted()
        {
            return true;
        }
        let owner = self.local_id(subject.attrs.owner, IdType::User);
        self.policy.any_access(cred, owner)
    }

    /// Checks search/execute permission, answering from the mode word when
    /// no entry can deny execute.
    pub fn fast_execute_check(
        &self,
        subject: &Subject<'_>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let attrs = subject.attrs;
        if attrs.pflags.contains(ObjectFlags::AV_QUARANTINED) {
            return Err(MetadataError::AccessDenied);
        }
        if !subject.is_xattr_dir() {
            if attrs.pflags.contains(ObjectFlags::NO_EXECS_DENIED) {
                return Ok(());
            }
            if attrs.owner.is_local() && attrs.group.is_local() {
                let bit = if cred.uid() == attrs.owner.rid() {
                    S_IXUSR
                } else if cred.in_group(attrs.group.rid()) {
                    S_IXGRP
                } else {
                    S_IXOTH
                };
                if attrs.mode & bit != 0 {
                    return Ok(());
                }
            }
        }
        debug_log!(Access, 2, "execute fast path missed for uid {}", cred.uid());
        self.access(subject, ACE_EXECUTE, false, cred)
    }

    fn sticky_check(
        &self,
        dir: &Subject<'_>,
        target: &Subject<'_>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        if self.options.is_replay() || dir.attrs.mode & S_ISVTX == 0 {
            return Ok(());
        }
        let downer = self.local_id(dir.attrs.owner, IdType::User);
        let fowner = self.local_id(target.attrs.owner, IdType::User);
        if cred.uid() == downer
            || cred.uid() == fowner
            || (target.attrs.object_type.is_regular()
                && self.access(target, ACE_WRITE_DATA, false, cred).is_ok())
        {
            return Ok(());
        }
        self.policy.remove(cred)
    }

    fn delete_final_check(
        &self,
        dir: &Subject<'_>,
        target: &Subject<'_>,
        available: u32,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let downer = self.local_id(dir.attrs.owner, IdType::User);
        self.legacy_access(cred, downer, available, VWRITE | VEXEC)?;
        self.sticky_check(dir, target, cred)
    }

    /// Decides whether `cred` may remove `target` from directory `dir`.
    pub fn delete_access(
        &self,
        dir: &Subject<'_>,
        target: &Subject<'_>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let locked = ObjectFlags::IMMUTABLE | ObjectFlags::NOUNLINK;
        if target.attrs.pflags.contains(locked) || dir.attrs.pflags.contains(locked) {
            return Err(MetadataError::NotPermitted);
        }

        let dir_refusal = match self.common(dir, ACE_DELETE_CHILD, cred) {
            Ok(()) => return self.delete_final_check(dir, target, VWRITE | VEXEC, cred),
            Err(refusal) => refusal,
        };
        let target_refusal = match self.common(target, ACE_DELETE, cred) {
            Ok(()) => return self.delete_final_check(dir, target, VWRITE | VEXEC, cred),
            Err(refusal) => refusal,
        };
        if let Refusal::Attribute(err) = dir_refusal {
            return Err(err);
        }
        if let Refusal::Attribute(err) = target_refusal {
            return Err(err);
        }

        if matches!(dir_refusal, Refusal::Denied(_)) {
            debug_log!(Access, 1, "delete_child denied for uid {}", cred.uid());
            return self.policy.remove(cred);
        }

        let working = match self.common(dir, ACE_EXECUTE | ACE_WRITE_DATA, cred) {
            Ok(()) => 0,
            Err(Refusal::Attribute(err)) => return Err(err),
            Err(Refusal::Denied(bits) | Refusal::Unresolved(bits)) => bits,
        };
        let mut available = if working & ACE_WRITE_DATA != 0 { 0 } else { VWRITE };
        if working & ACE_EXECUTE == 0 {
            available |= VEXEC;
        }
        self.delete_final_check(dir, target, available, cred)
    }

    /// Decides whether `cred` may move `source` out of `source_dir` into
    /// `target_dir`, replacing `replaced` when present.
    pub fn rename_access(
        &self,
        source_dir: &Subject<'_>,
        source: &Subject<'_>,
        target_dir: &Subject<'_>,
        replaced: Option<&Subject<'_>>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        if source.attrs.pflags.contains(ObjectFlags::AV_QUARANTINED) {
            return Err(MetadataError::AccessDenied);
        }
        let add = if source.attrs.is_dir() {
            ACE_ADD_SUBDIRECTORY
        } else {
            ACE_ADD_FILE
        };

        self.delete_access(source_dir, source, cred)?;
        if let Some(replaced) = replaced {
            self.delete_access(target_dir, replaced, cred)?;
        }
        self.access(target_dir, add, false, cred)
    }
}
