//! Encoding and decoding of the two on-disk ACE layouts.
//!
//! # Layouts
//!
//! All fields are little-endian.
//!
//! ```text
//! basic (12 bytes, every entry):
//!   who   : u32
//!   mask  : u32
//!   flags : u16
//!   type  : u16
//!
//! extended header (8 bytes):
//!   type  : u16
//!   flags : u16
//!   mask  : u32
//! extended entry (16 bytes):     header + who : u64
//! extended object entry (48 bytes): entry + object_type[16] + inherit_type[16]
//! ```
//!
//! ALLOW and DENY entries whose identity class is `owner@`, `group@` or
//! `everyone@` are stored as a bare extended header since `who` carries no
//! information for them.

use logging::debug_log;

use super::constants::*;
use super::entry::{
    Ace, AceFlags, AceType, IdentityClass, LayoutVersion, ObjectGuids, is_ephemeral,
};
use crate::error::AclCodecError;

/// Whether a local id names a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdType {
    /// User id.
    User,
    /// Group id.
    Group,
}

/// ACL-wide hints produced while validating entries for a new ACL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AceHints {
    /// At least one object-scoped entry is present.
    pub object_aces: bool,
    /// At least one entry propagates to children of a directory.
    pub inheritable: bool,
}

impl AceHints {
    /// Folds another set of hints into this one.
    pub fn merge(&mut self, other: AceHints) {
        self.object_aces |= other.object_aces;
        self.inheritable |= other.inheritable;
    }
}

/// Returns the stored size of an entry with the given type and flags.
#[must_use]
pub fn ace_size(layout: LayoutVersion, ace_type: AceType, flags: AceFlags) -> usize {
    match layout {
        LayoutVersion::Basic => BASIC_ACE_SIZE,
        LayoutVersion::Extended => {
            if ace_type.is_object() {
                EXTENDED_OBJECT_ACE_SIZE
            } else if ace_type.is_allow_or_deny() && flags.identity_class().is_special() {
                EXTENDED_ACE_HEADER_SIZE
            } else {
                EXTENDED_ACE_SIZE
            }
        }
    }
}

/// Reports whether a raw type code and flag combination is acceptable.
///
/// ALLOW, DENY, AUDIT and ALARM entries must name a recognised identity
/// class. The remaining known types are accepted as long as the code is in
/// range.
#[must_use]
pub fn valid_ace_type(ace_type: u16, flags: u16) -> bool {
    match ace_type {
        ACE_ACCESS_ALLOWED_ACE_TYPE
        | ACE_ACCESS_DENIED_ACE_TYPE
        | ACE_SYSTEM_AUDIT_ACE_TYPE
        | ACE_SYSTEM_ALARM_ACE_TYPE => {
            !matches!(IdentityClass::from_flags(flags), IdentityClass::Invalid(_))
        }
        other => other <= MAX_ACE_TYPE,
    }
}

/// Validates an entry supplied for a new ACL.
///
/// Returns the ACL-wide hints the entry contributes.
///
/// # Errors
///
/// Returns [`AclCodecError::InvalidAceCombination`] when the type and flags
/// do not agree, an object-scoped entry targets the basic layout, an
/// inherit-only or no-propagate entry is not inheritable at all, or a basic
/// layout entry names an ephemeral id.
pub fn ace_valid(
    is_dir: bool,
    layout: LayoutVersion,
    ace: &Ace,
) -> Result<AceHints, AclCodecError> {
    let raw_flags = ace.flags.as_raw();
    let invalid = || AclCodecError::InvalidAceCombination {
        ace_type: ace.ace_type.as_raw(),
        flags: raw_flags,
    };

    if !valid_ace_type(ace.ace_type.as_raw(), raw_flags) {
        return Err(invalid());
    }

    let mut hints = AceHints::default();
    if ace.ace_type.is_object() {
        if !layout.supports_object_aces() {
            return Err(invalid());
        }
        hints.object_aces = true;
    }

    if is_dir && ace.flags.is_inheritable() {
        hints.inheritable = true;
    }

    if ace
        .flags
        .contains(ACE_INHERIT_ONLY_ACE | ACE_NO_PROPAGATE_INHERIT_ACE)
        && !ace.flags.is_inheritable()
    {
        return Err(invalid());
    }

    if layout == LayoutVersion::Basic
        && !ace.is_special()
        && u32::try_from(ace.who).map_or(true, is_ephemeral)
    {
        return Err(invalid());
    }

    Ok(hints)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}

fn read_guid(bytes: &[u8], at: usize) -> [u8; OBJECT_GUID_SIZE] {
    let mut raw = [0u8; OBJECT_GUID_SIZE];
    raw.copy_from_slice(&bytes[at..at + OBJECT_GUID_SIZE]);
    raw
}

fn truncated(index: usize, offset: usize, needed: usize, available: usize) -> AclCodecError {
    AclCodecError::TruncatedEntry {
        index,
        offset,
        needed,
        available,
    }
}

fn corrupt(index: usize, offset: usize, reason: &'static str) -> AclCodecError {
    AclCodecError::CorruptAcl {
        index,
        offset,
        reason,
    }
}

/// Decodes one entry starting at `offset`.
///
/// `index` is the entry's position in the ACL and only feeds error reports.
/// Returns the entry and the number of bytes it occupied.
///
/// # Errors
///
/// [`AclCodecError::TruncatedEntry`] when fewer bytes remain than the entry
/// needs, [`AclCodecError::CorruptAcl`] for an unknown type code or an
/// object-scoped entry in the basic layout.
pub fn decode_ace(
    layout: LayoutVersion,
    bytes: &[u8],
    offset: usize,
    index: usize,
) -> Result<(Ace, usize), AclCodecError> {
    let available = bytes.len().saturating_sub(offset);
    let body = &bytes[offset.min(bytes.len())..];

    match layout {
        LayoutVersion::Basic => {
            if available < BASIC_ACE_SIZE {
                return Err(truncated(index, offset, BASIC_ACE_SIZE, available));
            }
            let who = read_u32(body, 0);
            let mask = read_u32(body, 4);
            let flags = read_u16(body, 8);
            let raw_type = read_u16(body, 10);
            let ace_type = AceType::try_from(raw_type)
                .map_err(|_| corrupt(index, offset, "unknown type code"))?;
            if ace_type.is_object() {
                return Err(corrupt(index, offset, "object entry in basic layout"));
            }
            Ok((
                Ace::new(ace_type, flags, mask, u64::from(who)),
                BASIC_ACE_SIZE,
            ))
        }
        LayoutVersion::Extended => {
            if available < EXTENDED_ACE_HEADER_SIZE {
                return Err(truncated(
                    index,
                    offset,
                    EXTENDED_ACE_HEADER_SIZE,
                    available,
                ));
            }
            let raw_type = read_u16(body, 0);
            let flags = read_u16(body, 2);
            let mask = read_u32(body, 4);
            let ace_type = AceType::try_from(raw_type)
                .map_err(|_| corrupt(index, offset, "unknown type code"))?;

            let size = ace_size(layout, ace_type, AceFlags::from_raw(flags));
            if available < size {
                return Err(truncated(index, offset, size, available));
            }

            let who = if size > EXTENDED_ACE_HEADER_SIZE {
                read_u64(body, EXTENDED_ACE_HEADER_SIZE)
            } else {
                SPECIAL_WHO
            };
            let mut ace = Ace::new(ace_type, flags, mask, who);
            if ace_type.is_object() {
                ace.object = Some(ObjectGuids {
                    object_type: read_guid(body, EXTENDED_ACE_SIZE),
                    inherit_type: read_guid(body, EXTENDED_ACE_SIZE + OBJECT_GUID_SIZE),
                });
            }
            Ok((ace, size))
        }
    }
}

/// Appends the stored form of `ace` to `out`.
///
/// # Errors
///
/// [`AclCodecError::InvalidAceCombination`] when the entry cannot be
/// represented in `layout`: an object-scoped type, or a `who` wider than
/// 32 bits, in the basic layout.
pub fn encode_ace(
    layout: LayoutVersion,
    ace: &Ace,
    out: &mut Vec<u8>,
) -> Result<(), AclCodecError> {
    let raw_type = ace.ace_type.as_raw();
    let raw_flags = ace.flags.as_raw();

    match layout {
        LayoutVersion::Basic => {
            let who = if ace.is_special() {
                u32::MAX
            } else {
                u32::try_from(ace.who).map_err(|_| AclCodecError::InvalidAceCombination {
                    ace_type: raw_type,
                    flags: raw_flags,
                })?
            };
            if ace.ace_type.is_object() {
                return Err(AclCodecError::InvalidAceCombination {
                    ace_type: raw_type,
                    flags: raw_flags,
                });
            }
            out.extend_from_slice(&who.to_le_bytes());
            out.extend_from_slice(&ace.mask.as_raw().to_le_bytes());
            out.extend_from_slice(&raw_flags.to_le_bytes());
            out.extend_from_slice(&raw_type.to_le_bytes());
        }
        LayoutVersion::Extended => {
            out.extend_from_slice(&raw_type.to_le_bytes());
            out.extend_from_slice(&raw_flags.to_le_bytes());
            out.extend_from_slice(&ace.mask.as_raw().to_le_bytes());

            let size = ace_size(layout, ace.ace_type, ace.flags);
            if size > EXTENDED_ACE_HEADER_SIZE {
                let who = if ace.is_special() { SPECIAL_WHO } else { ace.who };
                out.extend_from_slice(&who.to_le_bytes());
            }
            if ace.ace_type.is_object() {
                let guids = ace.object.unwrap_or_default();
                out.extend_from_slice(&guids.object_type);
                out.extend_from_slice(&guids.inherit_type);
            }
        }
    }
    Ok(())
}

/// Decodes exactly `count` entries from `bytes`.
///
/// # Errors
///
/// Any entry failure aborts the whole decode. Bytes left over after the
/// last entry are reported as [`AclCodecError::CorruptAcl`].
pub fn decode_acl(
    layout: LayoutVersion,
    bytes: &[u8],
    count: usize,
) -> Result<Vec<Ace>, AclCodecError> {
    let mut aces = Vec::with_capacity(count.min(MAX_ACL_ENTRIES));
    let mut offset = 0;

    for index in 0..count {
        let (ace, consumed) = decode_ace(layout, bytes, offset, index).inspect_err(|err| {
            debug_log!(Codec, 1, "decode of {layout:?} ACL failed: {err}");
        })?;
        offset += consumed;
        aces.push(ace);
    }

    if offset != bytes.len() {
        let err = corrupt(count, offset, "trailing bytes after last entry");
        debug_log!(Codec, 1, "decode of {layout:?} ACL failed: {err}");
        return Err(err);
    }

    debug_log!(Codec, 3, "decoded {count} {layout:?} entries ({offset} bytes)");
    #[cfg(feature = "tracing")]
    logging::trace_codec!(count, bytes = offset, ?layout, "decoded ACL");
    Ok(aces)
}

/// Encodes `aces` in order.
///
/// # Errors
///
/// Propagates the first [`encode_ace`] failure.
pub fn encode_acl(layout: LayoutVersion, aces: &[Ace]) -> Result<Vec<u8>, AclCodecError> {
    let mut out = Vec::with_capacity(
        aces.iter()
            .map(|ace| ace_size(layout, ace.ace_type, ace.flags))
            .sum(),
    );
    for ace in aces {
        encode_ace(layout, ace, &mut out)?;
    }
    Ok(out)
}

/// Total stored size of `aces` in `layout`.
#[must_use]
pub fn acl_byte_size(layout: LayoutVersion, aces: &[Ace]) -> usize {
    aces.iter()
        .map(|ace| ace_size(layout, ace.ace_type, ace.flags))
        .sum()
}

/// Identity mapping callback used while upgrading basic entries.
pub type UpgradeMapper<'a> = &'a mut dyn FnMut(u32, IdType) -> u64;

/// Rewrites a basic-layout entry for the extended layout.
///
/// Without a mapper, ephemeral ids collapse to [`UID_NOBODY`] and every
/// other id is carried over as a local composite id. With a mapper, the
/// mapper chooses the composite id. Special entries are unchanged.
///
/// # Errors
///
/// [`AclCodecError::InvalidAceCombination`] when the entry's type and flags
/// are not a valid combination.
pub fn upgrade_ace(ace: &Ace, mapper: Option<UpgradeMapper<'_>>) -> Result<Ace, AclCodecError> {
    if !valid_ace_type(ace.ace_type.as_raw(), ace.flags.as_raw()) {
        return Err(AclCodecError::InvalidAceCombination {
            ace_type: ace.ace_type.as_raw(),
            flags: ace.flags.as_raw(),
        });
    }

    let mut upgraded = ace.clone();
    if ace.is_special() {
        return Ok(upgraded);
    }

    let local = u32::try_from(ace.who).unwrap_or(u32::MAX);
    upgraded.who = match mapper {
        Some(map) => {
            let kind = if ace.identity_class() == IdentityClass::User {
                IdType::User
            } else {
                IdType::Group
            };
            map(local, kind)
        }
        None if is_ephemeral(local) => u64::from(UID_NOBODY),
        None => u64::from(local),
    };
    Ok(upgraded)
}

/// Rewrites every entry of a basic-layout ACL for the extended layout.
///
/// # Errors
///
/// Fails on the first entry [`upgrade_ace`] rejects; no partial result is
/// returned.
pub fn upgrade_acl(
    aces: &[Ace],
    mut mapper: Option<UpgradeMapper<'_>>,
) -> Result<Vec<Ace>, AclCodecError> {
    let mut upgraded = Vec::with_capacity(aces.len());
    for ace in aces {
        let next = match mapper.as_mut() {
            Some(map) => upgrade_ace(ace, Some(&mut **map))?,
            None => upgrade_ace(ace, None)?,
        };
        upgraded.push(next);
    }
    debug_log!(Codec, 1, "upgraded {} entries to extended layout", aces.len());
    Ok(upgraded)
}

