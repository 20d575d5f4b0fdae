//! Numeric constants shared by the ACE layouts and the ACL engine.
//!
//! Values are part of the persisted format and must never change.

// ---------------------------------------------------------------------------
// ACE type codes
// ---------------------------------------------------------------------------

/// Access allowed.
pub const ACE_ACCESS_ALLOWED_ACE_TYPE: u16 = 0x0000;
/// Access denied.
pub const ACE_ACCESS_DENIED_ACE_TYPE: u16 = 0x0001;
/// Audit record.
pub const ACE_SYSTEM_AUDIT_ACE_TYPE: u16 = 0x0002;
/// Alarm record.
pub const ACE_SYSTEM_ALARM_ACE_TYPE: u16 = 0x0003;
/// Compound allow.
pub const ACE_ACCESS_ALLOWED_COMPOUND_ACE_TYPE: u16 = 0x0004;
/// Object-scoped allow.
pub const ACE_ACCESS_ALLOWED_OBJECT_ACE_TYPE: u16 = 0x0005;
/// Object-scoped deny.
pub const ACE_ACCESS_DENIED_OBJECT_ACE_TYPE: u16 = 0x0006;
/// Object-scoped audit.
pub const ACE_SYSTEM_AUDIT_OBJECT_ACE_TYPE: u16 = 0x0007;
/// Object-scoped alarm.
pub const ACE_SYSTEM_ALARM_OBJECT_ACE_TYPE: u16 = 0x0008;
/// Callback allow.
pub const ACE_ACCESS_ALLOWED_CALLBACK_ACE_TYPE: u16 = 0x0009;
/// Callback deny.
pub const ACE_ACCESS_DENIED_CALLBACK_ACE_TYPE: u16 = 0x000A;
/// Object-scoped callback allow.
pub const ACE_ACCESS_ALLOWED_CALLBACK_OBJECT_ACE_TYPE: u16 = 0x000B;
/// Object-scoped callback deny.
pub const ACE_ACCESS_DENIED_CALLBACK_OBJECT_ACE_TYPE: u16 = 0x000C;
/// Callback audit.
pub const ACE_SYSTEM_AUDIT_CALLBACK_ACE_TYPE: u16 = 0x000D;
/// Callback alarm.
pub const ACE_SYSTEM_ALARM_CALLBACK_ACE_TYPE: u16 = 0x000E;
/// Object-scoped callback audit.
pub const ACE_SYSTEM_AUDIT_CALLBACK_OBJECT_ACE_TYPE: u16 = 0x000F;
/// Object-scoped callback alarm.
pub const ACE_SYSTEM_ALARM_CALLBACK_OBJECT_ACE_TYPE: u16 = 0x0010;

/// Highest type code the layouts accept.
pub const MAX_ACE_TYPE: u16 = ACE_SYSTEM_ALARM_CALLBACK_OBJECT_ACE_TYPE;

// ---------------------------------------------------------------------------
// ACE flags
// ---------------------------------------------------------------------------

/// Entry is inherited by files created in the directory.
pub const ACE_FILE_INHERIT_ACE: u16 = 0x0001;
/// Entry is inherited by directories created in the directory.
pub const ACE_DIRECTORY_INHERIT_ACE: u16 = 0x0002;
/// Inheritance stops after one level.
pub const ACE_NO_PROPAGATE_INHERIT_ACE: u16 = 0x0004;
/// Entry only propagates; it has no effect on the object carrying it.
pub const ACE_INHERIT_ONLY_ACE: u16 = 0x0008;
/// Audit successful accesses.
pub const ACE_SUCCESSFUL_ACCESS_ACE_FLAG: u16 = 0x0010;
/// Audit failed accesses.
pub const ACE_FAILED_ACCESS_ACE_FLAG: u16 = 0x0020;
/// `who` names a group.
pub const ACE_IDENTIFIER_GROUP: u16 = 0x0040;
/// Entry was produced by inheritance.
pub const ACE_INHERITED_ACE: u16 = 0x0080;
/// `owner@`.
pub const ACE_OWNER: u16 = 0x1000;
/// `group@` (always paired with [`ACE_IDENTIFIER_GROUP`]).
pub const ACE_GROUP: u16 = 0x2000;
/// `everyone@`.
pub const ACE_EVERYONE: u16 = 0x4000;

/// Bits that select the identity class of an entry.
pub const ACE_TYPE_FLAGS: u16 = ACE_OWNER | ACE_GROUP | ACE_EVERYONE | ACE_IDENTIFIER_GROUP;
/// Identity class of the owning group.
pub const OWNING_GROUP: u16 = ACE_GROUP | ACE_IDENTIFIER_GROUP;
/// Every inheritance related flag.
pub const ALL_INHERIT: u16 = ACE_FILE_INHERIT_ACE
    | ACE_DIRECTORY_INHERIT_ACE
    | ACE_NO_PROPAGATE_INHERIT_ACE
    | ACE_INHERIT_ONLY_ACE
    | ACE_INHERITED_ACE;

// ---------------------------------------------------------------------------
// Access mask bits
// ---------------------------------------------------------------------------

/// Read file data.
pub const ACE_READ_DATA: u32 = 0x0000_0001;
/// List a directory (same bit as [`ACE_READ_DATA`]).
pub const ACE_LIST_DIRECTORY: u32 = 0x0000_0001;
/// Write file data.
pub const ACE_WRITE_DATA: u32 = 0x0000_0002;
/// Create a file in a directory (same bit as [`ACE_WRITE_DATA`]).
pub const ACE_ADD_FILE: u32 = 0x0000_0002;
/// Append file data.
pub const ACE_APPEND_DATA: u32 = 0x0000_0004;
/// Create a subdirectory (same bit as [`ACE_APPEND_DATA`]).
pub const ACE_ADD_SUBDIRECTORY: u32 = 0x0000_0004;
/// Read named attributes.
pub const ACE_READ_NAMED_ATTRS: u32 = 0x0000_0008;
/// Write named attributes.
pub const ACE_WRITE_NAMED_ATTRS: u32 = 0x0000_0010;
/// Execute a file or search a directory.
pub const ACE_EXECUTE: u32 = 0x0000_0020;
/// Delete an entry of a directory.
pub const ACE_DELETE_CHILD: u32 = 0x0000_0040;
/// Read basic attributes.
pub const ACE_READ_ATTRIBUTES: u32 = 0x0000_0080;
/// Write basic attributes.
pub const ACE_WRITE_ATTRIBUTES: u32 = 0x0000_0100;
/// Delete the object.
pub const ACE_DELETE: u32 = 0x0001_0000;
/// Read the ACL.
pub const ACE_READ_ACL: u32 = 0x0002_0000;
/// Write the ACL.
pub const ACE_WRITE_ACL: u32 = 0x0004_0000;
/// Change the owner.
pub const ACE_WRITE_OWNER: u32 = 0x0008_0000;
/// Synchronize.
pub const ACE_SYNCHRONIZE: u32 = 0x0010_0000;

/// Every defined access bit.
pub const ACE_ALL_PERMS: u32 = 0x001F_01FF;

/// Mask value meaning "no masking in effect".
pub const ACL_NO_MASK: u32 = u32::MAX;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// `who` value stored for `owner@`, `group@` and `everyone@` entries.
pub const SPECIAL_WHO: u64 = u64::MAX;
/// Largest non-ephemeral local id.
pub const MAXUID: u32 = 0x7FFF_FFFF;
/// Local id substituted for ephemeral ids that cannot be carried over.
pub const UID_NOBODY: u32 = 60001;
/// Well-known "creator owner" id; never matches a plain user entry.
pub const CREATOR_OWNER_UID: u32 = 0x8000_0000;

// ---------------------------------------------------------------------------
// Layout sizes
// ---------------------------------------------------------------------------

/// Size of an entry in the basic layout.
pub const BASIC_ACE_SIZE: usize = 12;
/// Size of the extended layout header.
pub const EXTENDED_ACE_HEADER_SIZE: usize = 8;
/// Size of an extended entry carrying a `who`.
pub const EXTENDED_ACE_SIZE: usize = 16;
/// Size of one object GUID.
pub const OBJECT_GUID_SIZE: usize = 16;
/// Size of an extended object-scoped entry.
pub const EXTENDED_OBJECT_ACE_SIZE: usize = EXTENDED_ACE_SIZE + 2 * OBJECT_GUID_SIZE;

/// Largest number of entries a caller may place in one ACL.
pub const MAX_ACL_ENTRIES: usize = 1024;
