#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` interprets the access control lists of the aclfs engine. It
//! owns the in-memory [`Acl`] container, keeps the mode word and the ACL in
//! agreement, builds the ACLs of new objects from their parent directory,
//! and answers permission questions for a caller's [`Credential`].
//!
//! # Design
//!
//! The crate is layered bottom-up:
//!
//! - [`acl`] decodes stored bytes into an [`Acl`] and yields entries
//!   through a masked iterator.
//! - [`mode`] derives the mode word from an ACL and folds a mode back into
//!   one; [`inherit`] produces the ACL of a new object.
//! - [`access`] evaluates requested bits against an ACL, first match wins.
//! - [`permission`] adds the attribute checks, the [`PrivilegePolicy`]
//!   fallback and the NFSv4 delete table.
//! - [`apply`] runs all of the above against an [`ObjectStore`] under the
//!   per-object locks of [`ObjectLocks`].
//!
//! Identity mapping and persistence are collaborators behind the
//! [`IdentityMapper`] and [`ObjectStore`] traits. The engine itself performs
//! no I/O beyond those calls.
//!
//! # Invariants
//!
//! - Stored ACLs decode completely or not at all.
//! - Entries are evaluated in stored order and each bit is decided by the
//!   first entry that mentions it.
//! - Every persisted ACL is written together with the mode word and hints
//!   derived from it.
//!
//! # Errors
//!
//! Fallible operations return [`MetadataError`]. Access refusals are
//! [`MetadataError::AccessDenied`], [`MetadataError::NotPermitted`] or
//! [`MetadataError::ReadOnlyFilesystem`]; corrupt stored bytes surface as
//! [`MetadataError::Corrupt`].
//!
//! # Examples
//!
//! ```
//! use metadata::{
//!     AclManager, AclOptions, AclUpdate, Credential, LocalIdentityMapper, MemoryStore,
//!     ObjectType, Unprivileged,
//! };
//! use protocol::acl::{Ace, AceType, ACE_READ_DATA, ACE_WRITE_DATA};
//!
//! let manager = AclManager::new(
//!     MemoryStore::new(),
//!     LocalIdentityMapper,
//!     Unprivileged,
//!     AclOptions::new(),
//! );
//! let owner = Credential::new(1000, 100);
//! let guest = Credential::new(2000, 200);
//!
//! let file = manager.create_root(ObjectType::File, 0o644, &owner)?;
//! assert!(manager.access(file, ACE_WRITE_DATA, false, &guest).is_err());
//!
//! manager.set_acl(
//!     file,
//!     AclUpdate::new(vec![
//!         Ace::owner(AceType::Allow, ACE_READ_DATA | ACE_WRITE_DATA),
//!         Ace::user(AceType::Allow, 2000, ACE_WRITE_DATA),
//!     ]),
//!     &owner,
//! )?;
//! assert!(manager.access(file, ACE_WRITE_DATA, false, &guest).is_ok());
//! # Ok::<(), metadata::MetadataError>(())
//! ```

pub mod access;
pub mod acl;
pub mod apply;
pub mod error;
pub mod flags;
pub mod inherit;
pub mod mode;
pub mod options;
pub mod ownership;
pub mod permission;
pub mod store;

pub use access::{AccessOutcome, AccessRequest, CheckMode, check};
pub use acl::{AceView, Acl, AclIter};
pub use apply::{AclListing, AclManager, AclQuery, AclUpdate, CreateRequest, LoadedObject};
pub use error::MetadataError;
pub use flags::ObjectFlags;
pub use inherit::{InheritedAcl, NewObject, NewObjectAcl, inherit, new_object_acl, root_object_acl};
pub use mode::{ModeSummary, TrivialMasks, acl_from_mode, chmod_acl, is_trivial, mode_from_acl};
pub use options::{AclInherit, AclMode, AclOptions, ParsePolicyError};
pub use ownership::{
    Credential, DomainIdentityMapper, IdType, IdentityMapper, LocalIdentityMapper,
    MappingUnavailable,
};
pub use permission::{PermissionChecker, PrivilegePolicy, Subject, Superuser, Unprivileged};
pub use store::{MemoryStore, ObjectAttrs, ObjectId, ObjectLocks, ObjectStore, ObjectType, StoredAcl};
