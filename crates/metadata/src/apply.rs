//! Object-level ACL operations.
//!
//! [`AclManager`] ties the engine to its collaborators: an [`ObjectStore`]
//! holding ACL bytes and attributes, an [`IdentityMapper`] and a
//! [`PrivilegePolicy`]. Every operation follows the same shape. The stored
//! ACL is read, a decision or a new ACL is derived, and the result is
//! persisted while the object's lock from [`ObjectLocks`] is held.
//! Checks and listings hold the lock shared; chmod, chown, set and create
//! hold it exclusively.

use logging::{debug_log, warn_log};
use protocol::acl::{
    ACE_ADD_FILE, ACE_ADD_SUBDIRECTORY, ACE_IDENTIFIER_GROUP, ACE_READ_ACL, ACE_WRITE_ACL,
    ACE_WRITE_OWNER, Ace, AceHints, Fuid, IdType, LayoutVersion, MAX_ACL_ENTRIES, UID_NOBODY,
    UpgradeMapper, ace_valid,
};

use crate::acl::Acl;
use crate::error::MetadataError;
use crate::flags::ObjectFlags;
use crate::inherit::{NewObject, new_object_acl, root_object_acl};
use crate::mode::{S_IFMT, S_ISGID, chmod_acl, is_trivial, mode_from_acl};
use crate::options::AclOptions;
use crate::ownership::{Credential, IdentityMapper, LocalIdentityMapper};
use crate::permission::{PermissionChecker, PrivilegePolicy, Subject, Unprivileged};
use crate::store::{ObjectAttrs, ObjectId, ObjectLocks, ObjectStore, ObjectType};

/// A stored object with its ACL decoded and masks computed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedObject {
    /// Object id.
    pub id: ObjectId,
    /// Stored attributes.
    pub attrs: ObjectAttrs,
    /// Decoded ACL.
    pub acl: Acl,
}

/// Which entries [`AclManager::get_acl`] reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AclQuery {
    /// Include object-scoped entries.
    pub all_types: bool,
    /// Skip evaluating READ_ACL against the ACL, for callers that already
    /// hold the access. Attribute checks on the object still run.
    pub skip_check: bool,
}

/// Entries and ACL flags reported by [`AclManager::get_acl`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AclListing {
    /// Entries in evaluation order with identities mapped to local ids.
    pub entries: Vec<Ace>,
    /// The caller-visible ACL flags of the object.
    pub flags: ObjectFlags,
}

impl AclListing {
    /// Number of reported entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no entry was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replacement ACL for [`AclManager::set_acl`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AclUpdate {
    /// New entries. Identities are local ids.
    pub entries: Vec<Ace>,
    /// New ACL flags. `None` keeps the current ones.
    pub flags: Option<ObjectFlags>,
}

impl AclUpdate {
    /// Replaces the entries and keeps the current ACL flags.
    #[must_use]
    pub fn new(entries: Vec<Ace>) -> Self {
        Self {
            entries,
            flags: None,
        }
    }

    /// Also replaces the ACL flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = Some(flags);
        self
    }
}

/// Parameters of [`AclManager::create`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    /// Kind of the new object.
    pub object_type: ObjectType,
    /// Requested permission, set-id and sticky bits.
    pub mode: u32,
    /// Requested owning group as a local id.
    pub gid: Option<u32>,
    /// Explicit ACL replacing inheritance. Identities are local ids.
    pub acl: Option<Vec<Ace>>,
}

impl CreateRequest {
    /// Requests an object of `object_type` with `mode`.
    #[must_use]
    pub const fn new(object_type: ObjectType, mode: u32) -> Self {
        Self {
            object_type,
            mode,
            gid: None,
            acl: None,
        }
    }

    /// Requests an owning group.
    #[must_use]
    pub const fn with_gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    /// Supplies an explicit ACL.
    #[must_use]
    pub fn with_acl(mut self, aces: Vec<Ace>) -> Self {
        self.acl = Some(aces);
        self
    }
}

/// ACL operations on the objects of one filesystem.
#[derive(Debug)]
pub struct AclManager<S, M = LocalIdentityMapper, P = Unprivileged> {
    store: S,
    mapper: M,
    policy: P,
    options: AclOptions,
    locks: ObjectLocks,
}

impl<S, M, P> AclManager<S, M, P>
where
    S: ObjectStore,
    M: IdentityMapper,
    P: PrivilegePolicy,
{
    /// Creates a manager over `store`.
    pub fn new(store: S, mapper: M, policy: P, options: AclOptions) -> Self {
        Self {
            store,
            mapper,
            policy,
            options,
            locks: ObjectLocks::new(),
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The identity mapper.
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    /// The privilege policy.
    pub const fn policy(&self) -> &P {
        &self.policy
    }

    /// The filesystem options.
    pub const fn options(&self) -> &AclOptions {
        &self.options
    }

    /// The per-object lock registry.
    pub const fn locks(&self) -> &ObjectLocks {
        &self.locks
    }

    fn checker(&self) -> PermissionChecker<'_> {
        PermissionChecker::new(&self.options, &self.mapper, &self.policy)
    }

    fn composite(&self, id: u32, kind: IdType) -> Fuid {
        if !self.options.fuids_enabled() {
            return Fuid::local(id);
        }
        self.mapper.local_to_composite(id, kind).unwrap_or_else(|err| {
            warn_log!(Idmap, "mapping local {kind:?} {id}: {err}");
            Fuid::local(UID_NOBODY)
        })
    }

    fn local(&self, fuid: Fuid, kind: IdType) -> u32 {
        self.mapper.composite_to_local(fuid, kind).unwrap_or_else(|err| {
            warn_log!(Idmap, "mapping {kind:?} {:#x}: {err}", fuid.as_raw());
            UID_NOBODY
        })
    }

    /// Reads and decodes an object. The caller holds its lock.
    fn fetch(&self, id: ObjectId) -> Result<LoadedObject, MetadataError> {
        let attrs = self.store.attrs(id)?;
        let stored = self.store.read_acl(id)?;
        let mut acl = Acl::from_stored(&stored, attrs.owner, attrs.pflags).inspect_err(|err| {
            debug_log!(Codec, 1, "object {id}: stored ACL rejected: {err}");
        })?;
        acl.compute_masks(attrs.is_dir());
        Ok(LoadedObject { id, attrs, acl })
    }

    /// Reads the attributes and the decoded ACL of `id`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] for unknown objects and
    /// [`MetadataError::Corrupt`] when the stored bytes do not decode.
    pub fn read_acl(&self, id: ObjectId) -> Result<LoadedObject, MetadataError> {
        self.locks.read(id, || self.fetch(id))
    }

    /// Runs `f` on the subject for `object`, attaching the object an
    /// extended-attribute directory belongs to.
    ///
    /// Called with the lock of `object` held; the base is read under its
    /// own lock, so the order is always directory first, then base.
    fn with_subject<R>(
        &self,
        object: &LoadedObject,
        f: impl FnOnce(&Subject<'_>) -> Result<R, MetadataError>,
    ) -> Result<R, MetadataError> {
        let subject = Subject::new(&object.attrs, &object.acl);
        let base_id = object
            .attrs
            .xattr_parent
            .filter(|&base| subject.is_xattr_dir() && base != object.id);
        match base_id {
            Some(base_id) => {
                let base = self.read_acl(base_id)?;
                let base_subject = Subject::new(&base.attrs, &base.acl);
                f(&subject.with_base(&base_subject))
            }
            None => f(&subject),
        }
    }

    /// Decides whether `cred` may perform `requested` on `id`.
    ///
    /// `append` retries a refused WRITE_DATA request as APPEND_DATA.
    ///
    /// # Errors
    ///
    /// The refusal, or a failure to load the object.
    pub fn access(
        &self,
        id: ObjectId,
        requested: u32,
        append: bool,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        self.locks.read(id, || {
            let object = self.fetch(id)?;
            self.with_subject(&object, |subject| {
                self.checker().access(subject, requested, append, cred)
            })
        })
    }

    /// Checks a legacy `rwx` request given in the owner position.
    ///
    /// # Errors
    ///
    /// As [`AclManager::access`].
    pub fn access_rwx(
        &self,
        id: ObjectId,
        mode: u32,
        append: bool,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        self.locks.read(id, || {
            let object = self.fetch(id)?;
            self.with_subject(&object, |subject| {
                self.checker().access_rwx(subject, mode, append, cred)
            })
        })
    }

    /// Reports whether `cred` has any access at all to `id`.
    ///
    /// # Errors
    ///
    /// A failure to load the object.
    pub fn has_access(&self, id: ObjectId, cred: &Credential) -> Result<bool, MetadataError> {
        self.locks.read(id, || {
            let object = self.fetch(id)?;
            Ok(self
                .checker()
                .has_access(&Subject::new(&object.attrs, &object.acl), cred))
        })
    }

    /// Checks search permission on `id`.
    ///
    /// # Errors
    ///
    /// As [`AclManager::access`].
    pub fn fast_execute_check(&self, id: ObjectId, cred: &Credential) -> Result<(), MetadataError> {
        self.locks.read(id, || {
            let object = self.fetch(id)?;
            self.with_subject(&object, |subject| {
                self.checker().fast_execute_check(subject, cred)
            })
        })
    }

    /// Decides whether `cred` may remove `target` from directory `dir`.
    ///
    /// # Errors
    ///
    /// The refusal, or a failure to load either object.
    pub fn delete_access(
        &self,
        dir: ObjectId,
        target: ObjectId,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let dir = self.read_acl(dir)?;
        let target = self.read_acl(target)?;
        self.with_subject(&dir, |dir| {
            self.with_subject(&target, |target| {
                self.checker().delete_access(dir, target, cred)
            })
        })
    }

    /// Decides whether `cred` may move `source` from `source_dir` into
    /// `target_dir`, replacing `replaced` when present.
    ///
    /// # Errors
    ///
    /// The refusal, or a failure to load any of the objects.
    pub fn rename_access(
        &self,
        source_dir: ObjectId,
        source: ObjectId,
        target_dir: ObjectId,
        replaced: Option<ObjectId>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        let source_dir = self.read_acl(source_dir)?;
        let source = self.read_acl(source)?;
        let target_dir = self.read_acl(target_dir)?;
        let replaced = replaced.map(|id| self.read_acl(id)).transpose()?;
        let checker = self.checker();

        self.with_subject(&source_dir, |source_dir| {
            self.with_subject(&source, |source| {
                self.with_subject(&target_dir, |target_dir| match &replaced {
                    Some(replaced) => self.with_subject(replaced, |replaced| {
                        checker.rename_access(source_dir, source, target_dir, Some(replaced), cred)
                    }),
                    None => checker.rename_access(source_dir, source, target_dir, None, cred),
                })
            })
        })
    }

    /// Removes `id` from the store and drops its lock.
    ///
    /// Callers check [`AclManager::delete_access`] first; this only
    /// releases the object.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when the object does not exist.
    pub fn remove(&self, id: ObjectId) -> Result<(), MetadataError> {
        let removed = self.locks.write(id, || self.store.delete(id));
        self.locks.forget(id);
        debug_log!(Store, 2, "object {id}: lock released");
        removed
    }

    /// Lists the ACL of `id`.
    ///
    /// Entries are reported as evaluation sees them, with mode masking
    /// applied. Object-scoped entries are left out unless
    /// [`AclQuery::all_types`] is set.
    ///
    /// # Errors
    ///
    /// A refused READ_ACL check, or a failure to load the object.
    pub fn get_acl(
        &self,
        id: ObjectId,
        query: AclQuery,
        cred: &Credential,
    ) -> Result<AclListing, MetadataError> {
        self.locks.read(id, || {
            let object = self.fetch(id)?;
            self.with_subject(&object, |subject| {
                let checker = self.checker();
                if query.skip_check {
                    checker.attribute_check(subject, ACE_READ_ACL)
                } else {
                    checker.access(subject, ACE_READ_ACL, false, cred)
                }
            })?;

            let entries = object
                .acl
                .iter()
                .filter(|view| query.all_types || !view.ace_type.is_object())
                .map(|view| {
                    let mut ace = view.to_ace();
                    if !ace.is_special() {
                        let kind = if ace.flags.contains(ACE_IDENTIFIER_GROUP) {
                            IdType::Group
                        } else {
                            IdType::User
                        };
                        ace.who = u64::from(self.local(Fuid::from_raw(ace.who), kind));
                    }
                    ace
                })
                .collect();

            Ok(AclListing {
                entries,
                flags: object.attrs.pflags.intersect(ObjectFlags::V4_ACL_WIDE),
            })
        })
    }

    /// Builds a validated ACL from caller-supplied entries.
    fn build_acl(
        &self,
        is_dir: bool,
        owner: Fuid,
        entries: Vec<Ace>,
    ) -> Result<Acl, MetadataError> {
        if entries.is_empty() {
            return Err(MetadataError::EmptyAcl);
        }
        if entries.len() > MAX_ACL_ENTRIES {
            return Err(MetadataError::TooManyEntries {
                count: entries.len(),
                max: MAX_ACL_ENTRIES,
            });
        }

        let layout = self.options.layout();
        let mut acl = Acl::new(layout, owner);
        let mut hints = AceHints::default();
        for mut ace in entries {
            if !ace.is_special() && self.options.fuids_enabled() {
                let kind = if ace.flags.contains(ACE_IDENTIFIER_GROUP) {
                    IdType::Group
                } else {
                    IdType::User
                };
                // Identities wider than a local id are already composite.
                if let Ok(id) = u32::try_from(ace.who) {
                    ace.who = self.composite(id, kind).as_raw();
                }
            }
            hints.merge(ace_valid(is_dir, layout, &ace)?);
            acl.append(ace);
        }

        if hints.inheritable {
            acl.insert_hints(ObjectFlags::INHERIT_ACE);
        }
        if hints.object_aces {
            acl.insert_hints(ObjectFlags::ACL_OBJ_ACE);
        }
        Ok(acl)
    }

    /// Replaces the ACL of `id`.
    ///
    /// The mode word is recomputed from the new entries. A filesystem that
    /// uses composite identities stores the result in the extended layout.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotPermitted`] on immutable objects, a refused
    /// WRITE_ACL check, [`MetadataError::EmptyAcl`],
    /// [`MetadataError::TooManyEntries`] or [`MetadataError::InvalidAcl`]
    /// for unusable entries, or a store failure.
    pub fn set_acl(
        &self,
        id: ObjectId,
        update: AclUpdate,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        self.locks.write(id, || {
            let mut object = self.fetch(id)?;
            if object.attrs.pflags.contains(ObjectFlags::IMMUTABLE) {
                return Err(MetadataError::NotPermitted);
            }
            self.with_subject(&object, |subject| {
                self.checker().access(subject, ACE_WRITE_ACL, false, cred)
            })?;

            let mut acl = self.build_acl(object.attrs.is_dir(), object.attrs.owner, update.entries)?;
            let requested = match update.flags {
                Some(flags) => flags,
                None => object.attrs.pflags,
            };
            acl.insert_hints(requested.intersect(ObjectFlags::V4_ACL_WIDE).bits());
            acl.clear_masks();

            debug_log!(
                Container,
                1,
                "object {id}: uid {} replaces ACL with {} entries",
                cred.uid(),
                acl.len()
            );
            self.persist(id, &mut object.attrs, &mut acl)
        })
    }

    /// Changes the mode of `id` and returns the resulting mode word.
    ///
    /// The ACL is rewritten according to the `aclmode` policy. The set-gid
    /// bit is dropped when the caller may not set it for the owning group.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotPermitted`] on immutable objects, a refused
    /// WRITE_ACL check, or a store failure.
    pub fn chmod(&self, id: ObjectId, mode: u32, cred: &Credential) -> Result<u32, MetadataError> {
        self.locks.write(id, || {
            let object = self.fetch(id)?;
            if object.attrs.pflags.contains(ObjectFlags::IMMUTABLE) {
                return Err(MetadataError::NotPermitted);
            }
            self.with_subject(&object, |subject| {
                self.checker().access(subject, ACE_WRITE_ACL, false, cred)
            })?;

            let mut mode = mode;
            if mode & S_ISGID != 0 {
                let gid = self.local(object.attrs.group, IdType::Group);
                if !self.policy.setid_setgid(cred, gid) {
                    mode &= !S_ISGID;
                }
            }

            let LoadedObject {
                mut attrs, acl, ..
            } = object;
            let mut acl = chmod_acl(&self.options, acl, attrs.pflags, attrs.is_dir(), mode);
            attrs.mode = (attrs.mode & S_IFMT) | (mode & 0o7777);
            debug_log!(
                Mode,
                1,
                "object {id}: chmod {:o} under {}",
                mode & 0o7777,
                self.options.mode_policy()
            );
            self.persist(id, &mut attrs, &mut acl)?;
            Ok(attrs.mode)
        })
    }

    /// Changes the owner and/or owning group of `id`.
    ///
    /// The ACL bytes are kept; the mode word is recomputed because `owner@`
    /// and `group@` now resolve to different identities.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotPermitted`] on immutable objects, a refused
    /// WRITE_OWNER check, or a store failure.
    pub fn chown(
        &self,
        id: ObjectId,
        uid: Option<u32>,
        gid: Option<u32>,
        cred: &Credential,
    ) -> Result<(), MetadataError> {
        if uid.is_none() && gid.is_none() {
            return Ok(());
        }
        self.locks.write(id, || {
            let mut object = self.fetch(id)?;
            if object.attrs.pflags.contains(ObjectFlags::IMMUTABLE) {
                return Err(MetadataError::NotPermitted);
            }
            self.with_subject(&object, |subject| {
                self.checker().access(subject, ACE_WRITE_OWNER, false, cred)
            })?;

            let attrs = &mut object.attrs;
            if let Some(uid) = uid {
                attrs.owner = self.composite(uid, IdType::User);
            }
            if let Some(gid) = gid {
                attrs.group = self.composite(gid, IdType::Group);
            }
            object.acl.set_owner(attrs.owner);
            object.acl.compute_masks(attrs.is_dir());

            let summary = mode_from_acl(&object.acl, attrs.mode, attrs.owner, attrs.group);
            attrs.mode = summary.mode;
            summary.apply_to(&mut attrs.pflags);
            debug_log!(
                Mode,
                1,
                "object {id}: owner {:#x} group {:#x}, mode {:o}",
                attrs.owner.as_raw(),
                attrs.group.as_raw(),
                attrs.mode
            );
            self.store.set_attrs(id, attrs)
        })
    }

    /// Creates an object in directory `parent` and returns its id.
    ///
    /// The caller needs ADD_FILE or ADD_SUBDIRECTORY on the parent. The
    /// new object is owned by the caller; its group is the requested one
    /// when the caller may use it, otherwise the parent's group under a
    /// set-gid parent and the caller's primary group elsewhere.
    ///
    /// # Errors
    ///
    /// A refused check on the parent, an unusable explicit ACL, or a store
    /// failure.
    pub fn create(
        &self,
        parent: ObjectId,
        request: CreateRequest,
        cred: &Credential,
    ) -> Result<ObjectId, MetadataError> {
        let is_dir = request.object_type.is_dir();
        let add = if is_dir {
            ACE_ADD_SUBDIRECTORY
        } else {
            ACE_ADD_FILE
        };
        let parent = self.locks.read(parent, || {
            let object = self.fetch(parent)?;
            if !object.attrs.is_dir() {
                return Err(MetadataError::Unsupported("parent is not a directory"));
            }
            self.with_subject(&object, |subject| {
                self.checker().access(subject, add, false, cred)
            })?;
            Ok(object)
        })?;
        let parent_setgid = parent.attrs.mode & S_ISGID != 0;

        let owner = self.composite(cred.uid(), IdType::User);
        let requested_group = request.gid.and_then(|gid| {
            let fuid = self.composite(gid, IdType::Group);
            (fuid == parent.attrs.group || cred.in_group(gid) || self.policy.create_gid(cred))
                .then_some(fuid)
        });
        let group = requested_group.unwrap_or_else(|| {
            if parent_setgid {
                parent.attrs.group
            } else {
                self.composite(cred.gid(), IdType::Group)
            }
        });

        let mut mode = request.object_type.mode_bits() | (request.mode & 0o7777);
        if parent_setgid && is_dir {
            mode |= S_ISGID;
        } else if mode & S_ISGID != 0
            && !self
                .policy
                .setid_setgid(cred, self.local(group, IdType::Group))
        {
            mode &= !S_ISGID;
        }

        let explicit = request
            .acl
            .map(|aces| self.build_acl(is_dir, owner, aces))
            .transpose()?;
        let object = NewObject {
            object_type: request.object_type,
            mode,
            owner,
            group,
        };
        let derived = new_object_acl(&self.options, &parent.acl, &parent.attrs, &object, explicit);

        let id = self.store.allocate()?;
        debug_log!(
            Inherit,
            1,
            "object {id} in {}: {:?} mode {:o}, inherited {}",
            parent.id,
            request.object_type,
            derived.mode,
            derived.inherited
        );
        self.install(id, &object, derived.acl, derived.mode)?;
        Ok(id)
    }

    /// Creates an object without a parent, such as a filesystem root.
    ///
    /// # Errors
    ///
    /// A store failure.
    pub fn create_root(
        &self,
        object_type: ObjectType,
        mode: u32,
        cred: &Credential,
    ) -> Result<ObjectId, MetadataError> {
        let object = NewObject {
            object_type,
            mode: object_type.mode_bits() | (mode & 0o7777),
            owner: self.composite(cred.uid(), IdType::User),
            group: self.composite(cred.gid(), IdType::Group),
        };
        let derived = root_object_acl(&self.options, &object);
        let id = self.store.allocate()?;
        self.install(id, &object, derived.acl, derived.mode)?;
        Ok(id)
    }

    fn install(
        &self,
        id: ObjectId,
        object: &NewObject,
        mut acl: Acl,
        mode: u32,
    ) -> Result<(), MetadataError> {
        let mut attrs = ObjectAttrs::new(object.object_type, object.owner, object.group, mode);
        attrs.pflags = acl.hints();
        self.locks.write(id, || self.persist(id, &mut attrs, &mut acl))
    }

    /// Derives the mode word and hints for `acl` and writes both.
    fn persist(
        &self,
        id: ObjectId,
        attrs: &mut ObjectAttrs,
        acl: &mut Acl,
    ) -> Result<(), MetadataError> {
        let summary = mode_from_acl(acl, attrs.mode, attrs.owner, attrs.group);
        attrs.mode = summary.mode;
        summary.apply_to(&mut attrs.pflags);
        #[cfg(feature = "tracing")]
        logging::trace_mode!(object = %id, mode = summary.mode, "mode derived");

        if self.options.fuids_enabled() && acl.version() == LayoutVersion::Basic {
            let map: UpgradeMapper<'_> = &mut |local: u32, kind: IdType| {
                self.mapper
                    .local_to_composite(local, kind)
                    .map_or(u64::from(UID_NOBODY), Fuid::as_raw)
            };
            acl.upgrade(Some(map))?;
            debug_log!(Codec, 1, "object {id}: ACL upgraded to the extended layout");
        }

        attrs.pflags.remove(ObjectFlags::ACL_WIDE);
        attrs
            .pflags
            .insert(acl.hints().intersect(ObjectFlags::ACL_WIDE).bits());
        if is_trivial(acl) {
            attrs.pflags.insert(ObjectFlags::ACL_TRIVIAL);
        }

        let stored = acl.to_stored()?;
        self.store.commit(id, attrs, &stored)
    }
}

#[cfg(test)]
mod tests;
