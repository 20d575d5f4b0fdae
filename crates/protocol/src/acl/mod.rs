//! Access control entries and their on-disk layouts.
//!
//! This module defines the layout-independent [`Ace`] value and the codec
//! that moves entries between it and the two persisted layouts described
//! by [`LayoutVersion`].
//!
//! # Layout Overview
//!
//! - **Basic**: fixed 12-byte entries with a 32-bit local `who`. No object
//!   scoped entries and no room for composite identities.
//! - **Extended**: variable-size entries. `owner@`, `group@` and
//!   `everyone@` ALLOW/DENY entries are header-only, object-scoped entries
//!   carry two GUIDs, and every other entry carries a 64-bit composite `who`.
//!
//! A layout is chosen once per ACL. Moving a basic ACL to the extended layout
//! is an explicit step ([`upgrade_acl`]).
//!
//! # Validation
//!
//! Decoding only rejects what cannot be represented (unknown type codes,
//! object entries in the basic layout, short or over-long buffers). The
//! stricter [`ace_valid`] runs when a caller supplies a new ACL and also
//! yields the ACL-wide [`AceHints`].

mod constants;
mod entry;
mod wire;

pub use constants::*;
pub use entry::{
    AccessMask, Ace, AceFlags, AceType, Fuid, IdentityClass, LayoutVersion, ObjectGuids,
    UnknownAceType, is_ephemeral,
};
pub use wire::{
    AceHints, IdType, UpgradeMapper, acl_byte_size, ace_size, ace_valid, decode_ace, decode_acl,
    encode_ace, encode_acl, upgrade_ace, upgrade_acl, valid_ace_type,
};
