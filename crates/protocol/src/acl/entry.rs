//! Layout-independent access control entry values.
//!
//! An [`Ace`] is what every consumer of the engine sees: the decoded form of
//! one entry regardless of which on-disk layout it came from. The newtypes
//! [`AceFlags`] and [`AccessMask`] keep raw bit values but name the common
//! queries so callers rarely need to spell out masks.

use std::fmt;

use super::constants::*;

/// Type code of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum AceType {
    /// Access allowed.
    Allow = ACE_ACCESS_ALLOWED_ACE_TYPE,
    /// Access denied.
    Deny = ACE_ACCESS_DENIED_ACE_TYPE,
    /// Audit record.
    Audit = ACE_SYSTEM_AUDIT_ACE_TYPE,
    /// Alarm record.
    Alarm = ACE_SYSTEM_ALARM_ACE_TYPE,
    /// Compound allow.
    AllowedCompound = ACE_ACCESS_ALLOWED_COMPOUND_ACE_TYPE,
    /// Object-scoped allow.
    AllowedObject = ACE_ACCESS_ALLOWED_OBJECT_ACE_TYPE,
    /// Object-scoped deny.
    DeniedObject = ACE_ACCESS_DENIED_OBJECT_ACE_TYPE,
    /// Object-scoped audit.
    AuditObject = ACE_SYSTEM_AUDIT_OBJECT_ACE_TYPE,
    /// Object-scoped alarm.
    AlarmObject = ACE_SYSTEM_ALARM_OBJECT_ACE_TYPE,
    /// Callback allow.
    AllowedCallback = ACE_ACCESS_ALLOWED_CALLBACK_ACE_TYPE,
    /// Callback deny.
    DeniedCallback = ACE_ACCESS_DENIED_CALLBACK_ACE_TYPE,
    /// Object-scoped callback allow.
    AllowedCallbackObject = ACE_ACCESS_ALLOWED_CALLBACK_OBJECT_ACE_TYPE,
    /// Object-scoped callback deny.
    DeniedCallbackObject = ACE_ACCESS_DENIED_CALLBACK_OBJECT_ACE_TYPE,
    /// Callback audit.
    AuditCallback = ACE_SYSTEM_AUDIT_CALLBACK_ACE_TYPE,
    /// Callback alarm.
    AlarmCallback = ACE_SYSTEM_ALARM_CALLBACK_ACE_TYPE,
    /// Object-scoped callback audit.
    AuditCallbackObject = ACE_SYSTEM_AUDIT_CALLBACK_OBJECT_ACE_TYPE,
    /// Object-scoped callback alarm.
    AlarmCallbackObject = ACE_SYSTEM_ALARM_CALLBACK_OBJECT_ACE_TYPE,
}

impl AceType {
    /// Returns the raw type code.
    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }

    /// Reports whether entries of this type carry the two object GUIDs.
    ///
    /// Only the four plain object-scoped types do; the callback object types
    /// use the regular entry size.
    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(
            self,
            Self::AllowedObject | Self::DeniedObject | Self::AuditObject | Self::AlarmObject
        )
    }

    /// Reports whether the type takes part in access evaluation.
    #[must_use]
    pub const fn is_allow_or_deny(self) -> bool {
        matches!(self, Self::Allow | Self::Deny)
    }
}

/// Raw type code that does not name any known entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown ACE type code {0:#x}")]
pub struct UnknownAceType(pub u16);

impl TryFrom<u16> for AceType {
    type Error = UnknownAceType;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            ACE_ACCESS_ALLOWED_ACE_TYPE => Self::Allow,
            ACE_ACCESS_DENIED_ACE_TYPE => Self::Deny,
            ACE_SYSTEM_AUDIT_ACE_TYPE => Self::Audit,
            ACE_SYSTEM_ALARM_ACE_TYPE => Self::Alarm,
            ACE_ACCESS_ALLOWED_COMPOUND_ACE_TYPE => Self::AllowedCompound,
            ACE_ACCESS_ALLOWED_OBJECT_ACE_TYPE => Self::AllowedObject,
            ACE_ACCESS_DENIED_OBJECT_ACE_TYPE => Self::DeniedObject,
            ACE_SYSTEM_AUDIT_OBJECT_ACE_TYPE => Self::AuditObject,
            ACE_SYSTEM_ALARM_OBJECT_ACE_TYPE => Self::AlarmObject,
            ACE_ACCESS_ALLOWED_CALLBACK_ACE_TYPE => Self::AllowedCallback,
            ACE_ACCESS_DENIED_CALLBACK_ACE_TYPE => Self::DeniedCallback,
            ACE_ACCESS_ALLOWED_CALLBACK_OBJECT_ACE_TYPE => Self::AllowedCallbackObject,
            ACE_ACCESS_DENIED_CALLBACK_OBJECT_ACE_TYPE => Self::DeniedCallbackObject,
            ACE_SYSTEM_AUDIT_CALLBACK_ACE_TYPE => Self::AuditCallback,
            ACE_SYSTEM_ALARM_CALLBACK_ACE_TYPE => Self::AlarmCallback,
            ACE_SYSTEM_AUDIT_CALLBACK_OBJECT_ACE_TYPE => Self::AuditCallbackObject,
            ACE_SYSTEM_ALARM_CALLBACK_OBJECT_ACE_TYPE => Self::AlarmCallbackObject,
            other => return Err(UnknownAceType(other)),
        })
    }
}

/// Identity class selected by an entry's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityClass {
    /// A specific user named by `who`.
    User,
    /// A specific group named by `who`.
    Group,
    /// `owner@`: whoever owns the object.
    Owner,
    /// `group@`: the object's owning group.
    OwningGroup,
    /// `everyone@`.
    Everyone,
    /// Any other combination of the class bits.
    Invalid(u16),
}

impl IdentityClass {
    /// Classifies raw flag bits.
    #[must_use]
    pub const fn from_flags(flags: u16) -> Self {
        match flags & ACE_TYPE_FLAGS {
            0 => Self::User,
            ACE_IDENTIFIER_GROUP => Self::Group,
            ACE_OWNER => Self::Owner,
            OWNING_GROUP => Self::OwningGroup,
            ACE_EVERYONE => Self::Everyone,
            other => Self::Invalid(other),
        }
    }

    /// Returns the class bits for this identity.
    #[must_use]
    pub const fn as_flags(self) -> u16 {
        match self {
            Self::User => 0,
            Self::Group => ACE_IDENTIFIER_GROUP,
            Self::Owner => ACE_OWNER,
            Self::OwningGroup => OWNING_GROUP,
            Self::Everyone => ACE_EVERYONE,
            Self::Invalid(bits) => bits,
        }
    }

    /// Reports whether `who` is ignored for this class.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, Self::Owner | Self::OwningGroup | Self::Everyone)
    }
}

/// Entry flags: inheritance, audit and identity-class bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AceFlags(u16);

impl AceFlags {
    /// Inherited by files.
    pub const FILE_INHERIT: u16 = ACE_FILE_INHERIT_ACE;
    /// Inherited by directories.
    pub const DIRECTORY_INHERIT: u16 = ACE_DIRECTORY_INHERIT_ACE;
    /// Inheritance stops after one level.
    pub const NO_PROPAGATE_INHERIT: u16 = ACE_NO_PROPAGATE_INHERIT_ACE;
    /// Propagates only.
    pub const INHERIT_ONLY: u16 = ACE_INHERIT_ONLY_ACE;
    /// Audit successful accesses.
    pub const SUCCESSFUL_ACCESS: u16 = ACE_SUCCESSFUL_ACCESS_ACE_FLAG;
    /// Audit failed accesses.
    pub const FAILED_ACCESS: u16 = ACE_FAILED_ACCESS_ACE_FLAG;
    /// `who` is a group.
    pub const IDENTIFIER_GROUP: u16 = ACE_IDENTIFIER_GROUP;
    /// Produced by inheritance.
    pub const INHERITED: u16 = ACE_INHERITED_ACE;
    /// `owner@`.
    pub const OWNER: u16 = ACE_OWNER;
    /// `group@`.
    pub const GROUP: u16 = ACE_GROUP;
    /// `everyone@`.
    pub const EVERYONE: u16 = ACE_EVERYONE;

    /// Creates flags from raw value.
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    /// Returns the raw flags value.
    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self.0
    }

    /// Checks if any of the given bits are set.
    #[must_use]
    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    /// Returns a copy with the given bits set.
    #[must_use]
    pub const fn with(self, bits: u16) -> Self {
        Self(self.0 | bits)
    }

    /// Returns a copy with the given bits cleared.
    #[must_use]
    pub const fn without(self, bits: u16) -> Self {
        Self(self.0 & !bits)
    }

    /// Identity class encoded in the flags.
    #[must_use]
    pub const fn identity_class(self) -> IdentityClass {
        IdentityClass::from_flags(self.0)
    }

    /// Inheritance related bits only.
    #[must_use]
    pub const fn inherit_bits(self) -> u16 {
        self.0 & ALL_INHERIT
    }

    /// Reports whether the entry propagates to files or directories.
    #[must_use]
    pub const fn is_inheritable(self) -> bool {
        self.contains(ACE_FILE_INHERIT_ACE | ACE_DIRECTORY_INHERIT_ACE)
    }

    /// Reports whether the entry only propagates.
    #[must_use]
    pub const fn is_inherit_only(self) -> bool {
        self.contains(ACE_INHERIT_ONLY_ACE)
    }
}

/// Access mask (permission bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessMask(u32);

impl AccessMask {
    /// Read data / list directory.
    pub const READ_DATA: u32 = ACE_READ_DATA;
    /// Write data / add file.
    pub const WRITE_DATA: u32 = ACE_WRITE_DATA;
    /// Append data / add subdirectory.
    pub const APPEND_DATA: u32 = ACE_APPEND_DATA;
    /// Read named attributes.
    pub const READ_NAMED_ATTRS: u32 = ACE_READ_NAMED_ATTRS;
    /// Write named attributes.
    pub const WRITE_NAMED_ATTRS: u32 = ACE_WRITE_NAMED_ATTRS;
    /// Execute / search.
    pub const EXECUTE: u32 = ACE_EXECUTE;
    /// Delete an entry of a directory.
    pub const DELETE_CHILD: u32 = ACE_DELETE_CHILD;
    /// Read basic attributes.
    pub const READ_ATTRIBUTES: u32 = ACE_READ_ATTRIBUTES;
    /// Write basic attributes.
    pub const WRITE_ATTRIBUTES: u32 = ACE_WRITE_ATTRIBUTES;
    /// Delete the object.
    pub const DELETE: u32 = ACE_DELETE;
    /// Read the ACL.
    pub const READ_ACL: u32 = ACE_READ_ACL;
    /// Write the ACL.
    pub const WRITE_ACL: u32 = ACE_WRITE_ACL;
    /// Change owner.
    pub const WRITE_OWNER: u32 = ACE_WRITE_OWNER;
    /// Synchronize.
    pub const SYNCHRONIZE: u32 = ACE_SYNCHRONIZE;

    /// Creates a mask from raw value.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw mask value.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    /// Checks if any of the given bits are set.
    #[must_use]
    pub const fn contains(self, bits: u32) -> bool {
        (self.0 & bits) != 0
    }

    /// Checks if every given bit is set.
    #[must_use]
    pub const fn contains_all(self, bits: u32) -> bool {
        (self.0 & bits) == bits
    }

    /// Returns a copy with the given bits set.
    #[must_use]
    pub const fn with(self, bits: u32) -> Self {
        Self(self.0 | bits)
    }

    /// Returns a copy with the given bits cleared.
    #[must_use]
    pub const fn without(self, bits: u32) -> Self {
        Self(self.0 & !bits)
    }

    /// Returns the intersection with `bits`.
    #[must_use]
    pub const fn intersect(self, bits: u32) -> Self {
        Self(self.0 & bits)
    }
}

/// Composite identity: a domain index in the high half and a relative id
/// in the low half. Index 0 is the local domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fuid(u64);

impl Fuid {
    /// Builds a composite id from its parts.
    #[must_use]
    pub const fn new(index: u32, rid: u32) -> Self {
        Self(((index as u64) << 32) | rid as u64)
    }

    /// Local-domain id.
    #[must_use]
    pub const fn local(id: u32) -> Self {
        Self::new(0, id)
    }

    /// Wraps a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Domain index.
    #[must_use]
    pub const fn index(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Relative id within the domain.
    #[must_use]
    pub const fn rid(self) -> u32 {
        self.0 as u32
    }

    /// Reports whether the id lives in the local domain.
    #[must_use]
    pub const fn is_local(self) -> bool {
        self.index() == 0
    }
}

impl fmt::Display for Fuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.index(), self.rid())
    }
}

/// Reports whether a local id falls in the ephemeral range.
#[must_use]
pub const fn is_ephemeral(id: u32) -> bool {
    id > MAXUID
}

/// Object type and inherited object type carried by object-scoped entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGuids {
    /// Object type GUID.
    pub object_type: [u8; OBJECT_GUID_SIZE],
    /// Inherited object type GUID.
    pub inherit_type: [u8; OBJECT_GUID_SIZE],
}

/// On-disk layout an ACL is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayoutVersion {
    /// Fixed 12-byte entries with a 32-bit `who`.
    Basic,
    /// Variable-size entries with a 64-bit composite `who`.
    Extended,
}

impl LayoutVersion {
    /// Stored version number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Basic => 0,
            Self::Extended => 1,
        }
    }

    /// Parses a stored version number.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Basic),
            1 => Some(Self::Extended),
            _ => None,
        }
    }

    /// Reports whether object-scoped entries are representable.
    #[must_use]
    pub const fn supports_object_aces(self) -> bool {
        matches!(self, Self::Extended)
    }
}

/// A single access control entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ace {
    /// Entry type.
    pub ace_type: AceType,
    /// Inheritance, audit and identity-class flags.
    pub flags: AceFlags,
    /// Permission bits.
    pub mask: AccessMask,
    /// Identity; [`SPECIAL_WHO`] for `owner@`, `group@` and `everyone@`.
    pub who: u64,
    /// Object GUIDs, present exactly when `ace_type.is_object()`.
    pub object: Option<ObjectGuids>,
}

impl Ace {
    /// Builds an entry, normalising `who` for special identity classes and
    /// attaching empty object GUIDs to object-scoped types.
    #[must_use]
    pub fn new(ace_type: AceType, flags: u16, mask: u32, who: u64) -> Self {
        let flags = AceFlags::from_raw(flags);
        let who = if flags.identity_class().is_special() {
            SPECIAL_WHO
        } else {
            who
        };
        Self {
            ace_type,
            flags,
            mask: AccessMask::from_raw(mask),
            who,
            object: ace_type.is_object().then(ObjectGuids::default),
        }
    }

    /// `owner@` entry.
    #[must_use]
    pub fn owner(ace_type: AceType, mask: u32) -> Self {
        Self::new(ace_type, ACE_OWNER, mask, SPECIAL_WHO)
    }

    /// `group@` entry.
    #[must_use]
    pub fn owning_group(ace_type: AceType, mask: u32) -> Self {
        Self::new(ace_type, OWNING_GROUP, mask, SPECIAL_WHO)
    }

    /// `everyone@` entry.
    #[must_use]
    pub fn everyone(ace_type: AceType, mask: u32) -> Self {
        Self::new(ace_type, ACE_EVERYONE, mask, SPECIAL_WHO)
    }

    /// Entry naming a specific user.
    #[must_use]
    pub fn user(ace_type: AceType, who: u64, mask: u32) -> Self {
        Self::new(ace_type, 0, mask, who)
    }

    /// Entry naming a specific group.
    #[must_use]
    pub fn group(ace_type: AceType, who: u64, mask: u32) -> Self {
        Self::new(ace_type, ACE_IDENTIFIER_GROUP, mask, who)
    }

    /// Returns a copy with additional flag bits.
    #[must_use]
    pub fn with_flags(mut self, bits: u16) -> Self {
        self.flags = self.flags.with(bits);
        self
    }

    /// Returns a copy carrying the given object GUIDs.
    #[must_use]
    pub fn with_object(mut self, guids: ObjectGuids) -> Self {
        if self.ace_type.is_object() {
            self.object = Some(guids);
        }
        self
    }

    /// Identity class of the entry.
    #[must_use]
    pub const fn identity_class(&self) -> IdentityClass {
        self.flags.identity_class()
    }

    /// Reports whether `who` is ignored for this entry.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.identity_class().is_special()
    }

    /// Reports whether this is an ALLOW entry.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.ace_type == AceType::Allow
    }

    /// Reports whether this is a DENY entry.
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.ace_type == AceType::Deny
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity_class() {
            IdentityClass::Owner => f.write_str("owner@")?,
            IdentityClass::OwningGroup => f.write_str("group@")?,
            IdentityClass::Everyone => f.write_str("everyone@")?,
            IdentityClass::User => write!(f, "user:{}", Fuid::from_raw(self.who))?,
            IdentityClass::Group => write!(f, "group:{}", Fuid::from_raw(self.who))?,
            IdentityClass::Invalid(bits) => write!(f, "invalid({bits:#06x})")?,
        }
        write!(
            f,
            ":{:#x}:{:#06x}:{:?}",
            self.mask.as_raw(),
            self.flags.as_raw(),
            self.ace_type
        )
    }
}
