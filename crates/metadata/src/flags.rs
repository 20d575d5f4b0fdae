//! Per-object flag word.
//!
//! The low half carries ACL-wide hints maintained by this crate; the high
//! half carries object attributes set by the hosting filesystem.

use std::fmt;

/// Object flag word (`pflags`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectFlags(u64);

impl ObjectFlags {
    /// Object is an extended-attribute directory.
    pub const XATTR: u64 = 0x1;
    /// ACL has entries that propagate to new children.
    pub const INHERIT_ACE: u64 = 0x2;
    /// ACL is equivalent to the mode word.
    pub const ACL_TRIVIAL: u64 = 0x4;
    /// ACL has object-scoped entries.
    pub const ACL_OBJ_ACE: u64 = 0x8;
    /// ACL is protected from automatic inheritance.
    pub const ACL_PROTECTED: u64 = 0x10;
    /// ACL was produced by a default mechanism.
    pub const ACL_DEFAULTED: u64 = 0x20;
    /// ACL takes part in automatic inheritance.
    pub const ACL_AUTO_INHERIT: u64 = 0x40;
    /// No entry denies execute; the mode word answers execute checks.
    pub const NO_EXECS_DENIED: u64 = 0x100;
    /// Entries are masked by the mode-derived owner and group masks.
    pub const ACL_CHMOD: u64 = 0x200;
    /// Execute is masked off owner and group entries.
    pub const ACL_MASK_X: u64 = 0x400;

    /// Object is read-only.
    pub const READONLY: u64 = 0x0000_0001_0000_0000;
    /// Object may not be changed at all.
    pub const IMMUTABLE: u64 = 0x0000_0010_0000_0000;
    /// Object may not be removed.
    pub const NOUNLINK: u64 = 0x0000_0020_0000_0000;
    /// Object content is quarantined.
    pub const AV_QUARANTINED: u64 = 0x0000_0200_0000_0000;

    /// Hints owned by the ACL and rewritten whenever it is replaced.
    pub const ACL_WIDE: u64 = Self::ACL_TRIVIAL
        | Self::INHERIT_ACE
        | Self::ACL_OBJ_ACE
        | Self::ACL_PROTECTED
        | Self::ACL_DEFAULTED
        | Self::ACL_AUTO_INHERIT
        | Self::ACL_CHMOD
        | Self::ACL_MASK_X;
    /// Hints a caller may set through an ACL request.
    pub const V4_ACL_WIDE: u64 = Self::ACL_AUTO_INHERIT | Self::ACL_DEFAULTED | Self::ACL_PROTECTED;

    /// Creates a flag word from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Reports whether any of `bits` is set.
    #[must_use]
    pub const fn contains(self, bits: u64) -> bool {
        self.0 & bits != 0
    }

    /// Returns the word with `bits` set.
    #[must_use]
    pub const fn with(self, bits: u64) -> Self {
        Self(self.0 | bits)
    }

    /// Returns the word with `bits` cleared.
    #[must_use]
    pub const fn without(self, bits: u64) -> Self {
        Self(self.0 & !bits)
    }

    /// Returns only the bits also in `mask`.
    #[must_use]
    pub const fn intersect(self, mask: u64) -> Self {
        Self(self.0 & mask)
    }

    /// Sets `bits` in place.
    pub const fn insert(&mut self, bits: u64) {
        self.0 |= bits;
    }

    /// Clears `bits` in place.
    pub const fn remove(&mut self, bits: u64) {
        self.0 &= !bits;
    }

    /// Sets or clears `bits` in place.
    pub const fn set(&mut self, bits: u64, on: bool) {
        if on {
            self.insert(bits);
        } else {
            self.remove(bits);
        }
    }

    /// Reports whether mode-driven masking is active.
    #[must_use]
    pub const fn masking(self) -> bool {
        self.contains(Self::ACL_CHMOD | Self::ACL_MASK_X)
    }
}

impl fmt::LowerHex for ObjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
