//! Persistent store collaborator and per-object locking.
//!
//! [`ObjectStore`] is the boundary to whatever keeps ACL bytes and object
//! attributes. [`MemoryStore`] is a concurrent in-memory implementation.
//! [`ObjectLocks`] hands out one reader/writer lock per object so a caller
//! can hold "read stored ACL, derive, persist" as a single critical section.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use logging::debug_log;
use protocol::acl::{Fuid, LayoutVersion};
use rustc_hash::FxBuildHasher;

use crate::error::MetadataError;
use crate::flags::ObjectFlags;
use crate::mode::{S_IFDIR, S_IFLNK, S_IFMT, S_IFREG};

/// Identifier of a stored object.
pub type ObjectId = u64;

/// Kind of a stored object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjectType {
    /// Regular file.
    #[default]
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Device, fifo, socket or anything else.
    Other,
}

impl ObjectType {
    /// Reports whether the object is a directory.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Reports whether the object is a regular file.
    #[must_use]
    pub const fn is_regular(self) -> bool {
        matches!(self, Self::File)
    }

    /// File type bits of the mode word.
    #[must_use]
    pub const fn mode_bits(self) -> u32 {
        match self {
            Self::File => S_IFREG,
            Self::Directory => S_IFDIR,
            Self::Symlink => S_IFLNK,
            Self::Other => 0,
        }
    }

    /// Derives the kind from the file type bits of a mode word.
    #[must_use]
    pub const fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => Self::File,
            S_IFDIR => Self::Directory,
            S_IFLNK => Self::Symlink,
            _ => Self::Other,
        }
    }
}

/// Attributes of a stored object that the ACL engine reads or maintains.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectAttrs {
    /// Object kind.
    pub object_type: ObjectType,
    /// Owner identity.
    pub owner: Fuid,
    /// Owning group identity.
    pub group: Fuid,
    /// Mode word including the file type bits.
    pub mode: u32,
    /// Hint and attribute flags.
    pub pflags: ObjectFlags,
    /// For extended-attribute directories, the object they belong to.
    pub xattr_parent: Option<ObjectId>,
}

impl ObjectAttrs {
    /// Builds attributes for an object of `object_type` with `perm` bits.
    #[must_use]
    pub const fn new(object_type: ObjectType, owner: Fuid, group: Fuid, perm: u32) -> Self {
        Self {
            object_type,
            owner,
            group,
            mode: object_type.mode_bits() | (perm & 0o7777),
            pflags: ObjectFlags::from_bits(0),
            xattr_parent: None,
        }
    }

    /// Reports whether the object is a directory.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.object_type.is_dir()
    }

    /// Permission bits without the file type.
    #[must_use]
    pub const fn perm(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Encoded ACL as kept by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAcl {
    /// Layout of `bytes`.
    pub version: LayoutVersion,
    /// Encoded entries.
    pub bytes: Vec<u8>,
    /// Number of entries in `bytes`.
    pub count: usize,
}

impl StoredAcl {
    /// An ACL with no entries.
    #[must_use]
    pub const fn empty(version: LayoutVersion) -> Self {
        Self {
            version,
            bytes: Vec::new(),
            count: 0,
        }
    }
}

/// Persistent store of ACL bytes and object attributes.
///
/// Implementations must make [`ObjectStore::commit`] atomic with respect
/// to concurrent reads of the same object.
pub trait ObjectStore: Send + Sync {
    /// Reads the attributes of `id`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when the object does not exist.
    fn attrs(&self, id: ObjectId) -> Result<ObjectAttrs, MetadataError>;

    /// Reads the stored ACL of `id`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when the object does not exist.
    fn read_acl(&self, id: ObjectId) -> Result<StoredAcl, MetadataError>;

    /// Writes attributes and ACL of `id` in one step, creating the object
    /// when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn commit(&self, id: ObjectId, attrs: &ObjectAttrs, acl: &StoredAcl)
    -> Result<(), MetadataError>;

    /// Writes only the attributes of an existing object.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when the object does not exist.
    fn set_attrs(&self, id: ObjectId, attrs: &ObjectAttrs) -> Result<(), MetadataError> {
        let acl = self.read_acl(id)?;
        self.commit(id, attrs, &acl)
    }

    /// Reserves an id for an object about to be created.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying store.
    fn allocate(&self) -> Result<ObjectId, MetadataError>;

    /// Removes `id` together with its ACL.
    ///
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when the object does not exist.
    fn delete(&self, id: ObjectId) -> Result<(), MetadataError>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    fn attrs(&self, id: ObjectId) -> Result<ObjectAttrs, MetadataError> {
        (**self).attrs(id)
    }

    fn read_acl(&self, id: ObjectId) -> Result<StoredAcl, MetadataError> {
        (**self).read_acl(id)
    }

    fn commit(
        &self,
        id: ObjectId,
        attrs: &ObjectAttrs,
        acl: &StoredAcl,
    ) -> Result<(), MetadataError> {
        (**self).commit(id, attrs, acl)
    }

    fn set_attrs(&self, id: ObjectId, attrs: &ObjectAttrs) -> Result<(), MetadataError> {
        (**self).set_attrs(id, attrs)
    }

    fn allocate(&self) -> Result<ObjectId, MetadataError> {
        (**self).allocate()
    }

    fn delete(&self, id: ObjectId) -> Result<(), MetadataError> {
        (**self).delete(id)
    }
}

#[derive(Clone, Debug)]
struct StoredObject {
    attrs: ObjectAttrs,
    acl: StoredAcl,
}

/// Concurrent in-memory [`ObjectStore`].
///
/// Attributes and ACL of one object live in one map slot, so a commit is
/// never observed half done.
#[derive(Debug)]
pub struct MemoryStore {
    objects: DashMap<ObjectId, StoredObject, FxBuildHasher>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store. Allocated ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicU64::new(1),
        }
    }

    /// Reserves a fresh object id.
    pub fn allocate_id(&self) -> ObjectId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Removes an object, returning whether it existed.
    pub fn remove(&self, id: ObjectId) -> bool {
        self.objects.remove(&id).is_some()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Reports whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    fn attrs(&self, id: ObjectId) -> Result<ObjectAttrs, MetadataError> {
        self.objects
            .get(&id)
            .map(|entry| entry.value().attrs.clone())
            .ok_or(MetadataError::NotFound(id))
    }

    fn read_acl(&self, id: ObjectId) -> Result<StoredAcl, MetadataError> {
        self.objects
            .get(&id)
            .map(|entry| entry.value().acl.clone())
            .ok_or(MetadataError::NotFound(id))
    }

    fn commit(
        &self,
        id: ObjectId,
        attrs: &ObjectAttrs,
        acl: &StoredAcl,
    ) -> Result<(), MetadataError> {
        debug_log!(
            Store,
            1,
            "object {id}: {} entries ({} bytes, {:?}), mode {:o}",
            acl.count,
            acl.bytes.len(),
            acl.version,
            attrs.mode
        );
        self.objects.insert(
            id,
            StoredObject {
                attrs: attrs.clone(),
                acl: acl.clone(),
            },
        );
        Ok(())
    }

    fn set_attrs(&self, id: ObjectId, attrs: &ObjectAttrs) -> Result<(), MetadataError> {
        let mut entry = self.objects.get_mut(&id).ok_or(MetadataError::NotFound(id))?;
        debug_log!(Store, 2, "object {id}: attributes only, mode {:o}", attrs.mode);
        entry.attrs = attrs.clone();
        Ok(())
    }

    fn allocate(&self) -> Result<ObjectId, MetadataError> {
        Ok(self.allocate_id())
    }

    fn delete(&self, id: ObjectId) -> Result<(), MetadataError> {
        if self.remove(id) {
            debug_log!(Store, 1, "object {id}: removed");
            Ok(())
        } else {
            Err(MetadataError::NotFound(id))
        }
    }
}

/// Registry of per-object reader/writer locks.
///
/// A lock is created on first use and stays until [`ObjectLocks::forget`]
/// drops it, which [`crate::AclManager::remove`] does for removed objects.
#[derive(Debug, Default)]
pub struct ObjectLocks {
    locks: DashMap<ObjectId, Arc<RwLock<()>>, FxBuildHasher>,
}

impl ObjectLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: ObjectId) -> Arc<RwLock<()>> {
        Arc::clone(self.locks.entry(id).or_default().value())
    }

    /// Runs `f` while holding the object's lock shared.
    pub fn read<R>(&self, id: ObjectId, f: impl FnOnce() -> R) -> R {
        let lock = self.handle(id);
        let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Runs `f` while holding the object's lock exclusively.
    pub fn write<R>(&self, id: ObjectId, f: impl FnOnce() -> R) -> R {
        let lock = self.handle(id);
        let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Drops the lock of a removed object.
    pub fn forget(&self, id: ObjectId) {
        self.locks.remove(&id);
    }

    /// Number of objects with a lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Reports whether no lock has been handed out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
