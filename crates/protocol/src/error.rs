use std::io;

/// Errors raised while decoding, encoding or validating access control entries.
///
/// Decode failures are never partially recovered: an ACL is either fully
/// decoded or rejected as a whole, because entry positions carry evaluation
/// priority.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AclCodecError {
    /// A stored entry is structurally invalid (unknown type code, a layout it
    /// cannot appear in, or bytes left over after the last entry).
    #[error("corrupt ACL: entry {index} at byte {offset}: {reason}")]
    CorruptAcl {
        /// Position of the offending entry within the ACL.
        index: usize,
        /// Byte offset of the offending entry within the buffer.
        offset: usize,
        /// Short description of what was wrong.
        reason: &'static str,
    },
    /// The buffer ended before the entry at `offset` was complete.
    #[error("truncated ACL entry {index} at byte {offset}: need {needed} bytes, {available} left")]
    TruncatedEntry {
        /// Position of the offending entry within the ACL.
        index: usize,
        /// Byte offset of the offending entry within the buffer.
        offset: usize,
        /// Size of the entry being decoded.
        needed: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },
    /// An entry's type and flags do not form a valid combination for the
    /// target layout or object.
    #[error("invalid ACE combination: type {ace_type:#x}, flags {flags:#06x}")]
    InvalidAceCombination {
        /// Raw type code.
        ace_type: u16,
        /// Raw flag bits.
        flags: u16,
    },
}

impl AclCodecError {
    /// Returns the index of the entry that triggered the failure, when known.
    #[must_use]
    pub const fn entry_index(&self) -> Option<usize> {
        match self {
            Self::CorruptAcl { index, .. } | Self::TruncatedEntry { index, .. } => Some(*index),
            Self::InvalidAceCombination { .. } => None,
        }
    }

    /// Reports whether the error came from reading stored bytes.
    #[must_use]
    pub const fn is_decode_failure(&self) -> bool {
        matches!(self, Self::CorruptAcl { .. } | Self::TruncatedEntry { .. })
    }
}

impl From<AclCodecError> for io::Error {
    fn from(err: AclCodecError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_entry_position() {
        let err = AclCodecError::CorruptAcl {
            index: 3,
            offset: 36,
            reason: "unknown type code",
        };
        assert_eq!(
            err.to_string(),
            "corrupt ACL: entry 3 at byte 36: unknown type code"
        );
    }

    #[test]
    fn display_reports_truncation_sizes() {
        let err = AclCodecError::TruncatedEntry {
            index: 0,
            offset: 0,
            needed: 16,
            available: 5,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("need 16 bytes"));
        assert!(rendered.contains("5 left"));
    }

    #[test]
    fn accessors_expose_variant_context() {
        let corrupt = AclCodecError::CorruptAcl {
            index: 2,
            offset: 24,
            reason: "x",
        };
        assert_eq!(corrupt.entry_index(), Some(2));
        assert!(corrupt.is_decode_failure());

        let invalid = AclCodecError::InvalidAceCombination {
            ace_type: 5,
            flags: 0,
        };
        assert_eq!(invalid.entry_index(), None);
        assert!(!invalid.is_decode_failure());
    }

    #[test]
    fn converts_to_io_error_preserving_kind_and_source() {
        let err = AclCodecError::InvalidAceCombination {
            ace_type: 6,
            flags: 0x1000,
        };
        let io_err: io::Error = err.clone().into();

        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);

        let source = io_err
            .get_ref()
            .and_then(|src| src.downcast_ref::<AclCodecError>())
            .expect("io::Error must carry AclCodecError source");
        assert_eq!(source, &err);
    }
}
