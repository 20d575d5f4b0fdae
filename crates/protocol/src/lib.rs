#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Access control entry types and the persisted ACE layouts of the aclfs
//! engine.
//!
//! The crate is deliberately small: it owns the numeric constants, the
//! layout-independent [`acl::Ace`] value and the codec between that value
//! and the two on-disk layouts. Everything that interprets an ACL (masking,
//! mode synthesis, inheritance, evaluation) lives in the `metadata` crate.
//!
//! # Examples
//!
//! Encode an ACL in the extended layout and read it back.
//!
//! ```
//! use protocol::acl::{Ace, AceType, LayoutVersion, ACE_READ_DATA, ACE_WRITE_DATA};
//! use protocol::acl::{decode_acl, encode_acl};
//!
//! let aces = vec![
//!     Ace::owner(AceType::Allow, ACE_READ_DATA | ACE_WRITE_DATA),
//!     Ace::user(AceType::Deny, 1001, ACE_WRITE_DATA),
//! ];
//! let bytes = encode_acl(LayoutVersion::Extended, &aces).expect("encodable");
//! assert_eq!(bytes.len(), 8 + 16);
//!
//! let decoded = decode_acl(LayoutVersion::Extended, &bytes, aces.len()).expect("valid");
//! assert_eq!(decoded, aces);
//! ```
//!
//! Decoding never returns a partial ACL.
//!
//! ```
//! use protocol::acl::{decode_acl, LayoutVersion};
//! use protocol::AclCodecError;
//!
//! let err = decode_acl(LayoutVersion::Basic, &[0u8; 20], 2).unwrap_err();
//! assert!(matches!(err, AclCodecError::TruncatedEntry { index: 1, .. }));
//! ```

pub mod acl;
mod error;

pub use error::AclCodecError;
