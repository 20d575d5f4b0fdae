//! Errors reported by ACL and permission operations.

use std::io;

use protocol::AclCodecError;

use crate::store::ObjectId;

/// Error produced by ACL and permission operations on stored objects.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Stored permission data could not be decoded.
    #[error("permission data corrupt: {0}")]
    Corrupt(#[source] AclCodecError),
    /// A caller supplied ACL contains an entry that cannot be stored.
    #[error("invalid ACL: {0}")]
    InvalidAcl(#[source] AclCodecError),
    /// A caller supplied ACL has no entries.
    #[error("ACL must contain at least one entry")]
    EmptyAcl,
    /// A caller supplied ACL has more entries than may be stored.
    #[error("ACL has {count} entries, at most {max} allowed")]
    TooManyEntries {
        /// Number of entries supplied.
        count: usize,
        /// Largest accepted count.
        max: usize,
    },
    /// No object with the given id exists.
    #[error("object {0} not found")]
    NotFound(ObjectId),
    /// The request does not make sense for the object.
    #[error("unsupported request: {0}")]
    Unsupported(&'static str),
    /// The filesystem is mounted read-only.
    #[error("read-only filesystem")]
    ReadOnlyFilesystem,
    /// An object attribute forbids the operation regardless of the ACL.
    #[error("operation not permitted")]
    NotPermitted,
    /// The ACL and the privilege policy both refuse the access.
    #[error("permission denied")]
    AccessDenied,
    /// The persistent store failed.
    #[error("store error: {0}")]
    Store(#[from] io::Error),
}

impl MetadataError {
    /// Reports whether the error is an ordinary access refusal.
    #[must_use]
    pub const fn is_access_refusal(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied | Self::NotPermitted | Self::ReadOnlyFilesystem
        )
    }
}

impl From<AclCodecError> for MetadataError {
    fn from(err: AclCodecError) -> Self {
        if err.is_decode_failure() {
            Self::Corrupt(err)
        } else {
            Self::InvalidAcl(err)
        }
    }
}

impl From<MetadataError> for io::Error {
    fn from(err: MetadataError) -> Self {
        let kind = match &err {
            MetadataError::Corrupt(_) => io::ErrorKind::InvalidData,
            MetadataError::InvalidAcl(_)
            | MetadataError::EmptyAcl
            | MetadataError::TooManyEntries { .. } => io::ErrorKind::InvalidInput,
            MetadataError::NotFound(_) => io::ErrorKind::NotFound,
            MetadataError::Unsupported(_) => io::ErrorKind::Unsupported,
            MetadataError::ReadOnlyFilesystem => io::ErrorKind::ReadOnlyFilesystem,
            MetadataError::NotPermitted | MetadataError::AccessDenied => {
                io::ErrorKind::PermissionDenied
            }
            MetadataError::Store(inner) => inner.kind(),
        };
        io::Error::new(kind, err)
    }
}
