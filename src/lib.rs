#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `aclfs` bundles the crates of the ACL engine behind one dependency:
//!
//! - [`protocol`]: ACE values, access and flag constants, the basic and
//!   extended on-disk layouts.
//! - [`metadata`]: the ACL container, mode synchronisation, inheritance,
//!   access evaluation and the object-level operations of [`AclManager`].
//! - [`logging`]: diagnostic categories, verbosity levels and event capture.
//!
//! The most common entry points are re-exported at the crate root.
//!
//! # Examples
//!
//! ```
//! use aclfs::{AclManager, AclOptions, CreateRequest, Credential, LocalIdentityMapper};
//! use aclfs::{MemoryStore, ObjectType, Unprivileged};
//! use aclfs::protocol::acl::{Ace, AceType, ACE_ADD_FILE, ACE_FILE_INHERIT_ACE, ACE_READ_DATA};
//!
//! let manager = AclManager::new(
//!     MemoryStore::new(),
//!     LocalIdentityMapper,
//!     Unprivileged,
//!     AclOptions::new(),
//! );
//! let owner = Credential::new(1000, 100);
//! let dir = manager.create_root(ObjectType::Directory, 0o755, &owner)?;
//!
//! let inheritable = Ace::new(AceType::Allow, ACE_FILE_INHERIT_ACE, ACE_READ_DATA, 2000);
//! manager.set_acl(
//!     dir,
//!     aclfs::AclUpdate::new(vec![
//!         Ace::owner(AceType::Allow, ACE_ADD_FILE | ACE_READ_DATA),
//!         inheritable,
//!     ]),
//!     &owner,
//! )?;
//!
//! let file = manager.create(dir, CreateRequest::new(ObjectType::File, 0o640), &owner)?;
//! let guest = Credential::new(2000, 200);
//! assert!(manager.access(file, ACE_READ_DATA, false, &guest).is_ok());
//! # Ok::<(), aclfs::MetadataError>(())
//! ```

pub use logging;
pub use metadata;
pub use protocol;

pub use metadata::{
    AclInherit, AclListing, AclManager, AclMode, AclOptions, AclQuery, AclUpdate,
    CreateRequest, Credential, IdentityMapper, LocalIdentityMapper, MemoryStore,
    MetadataError, ObjectId, ObjectStore, ObjectType, PrivilegePolicy, Superuser, Unprivileged,
};
pub use protocol::AclCodecError;
