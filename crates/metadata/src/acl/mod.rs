//! In-memory ACL container.
//!
//! An [`Acl`] owns the ordered entries of one object together with the
//! ACL-wide hints and the two masks that the mode synchroniser derives
//! from the owner and owning-group entries. Entries are kept in evaluation
//! order: the first entry that matches a bit decides it.
//!
//! # Masked iteration
//!
//! [`Acl::iter`] yields [`AceView`]s. While [`ObjectFlags::ACL_CHMOD`] or
//! [`ObjectFlags::ACL_MASK_X`] is set, every effective ALLOW entry naming a
//! plain user or group has its mask intersected with
//! [`Acl::owner_mask`] (when it names the owner) or [`Acl::group_mask`]
//! before it is yielded. Callers never apply the masks themselves.
//! [`Acl::aces`] exposes the stored entries untouched.

use logging::debug_log;
use protocol::AclCodecError;
use protocol::acl::{
    ACE_EXECUTE, ACE_IDENTIFIER_GROUP, ACE_INHERIT_ONLY_ACE, ACE_TYPE_FLAGS, ACL_NO_MASK,
    AccessMask, Ace, AceFlags, AceType, Fuid, IdentityClass, LayoutVersion, ObjectGuids,
    UpgradeMapper, ace_size, decode_acl, encode_acl, upgrade_acl, valid_ace_type,
};

use crate::flags::ObjectFlags;
use crate::store::StoredAcl;

/// Ordered entries of one object plus the state derived from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acl {
    version: LayoutVersion,
    entries: Vec<Ace>,
    byte_size: usize,
    owner: Fuid,
    hints: ObjectFlags,
    owner_mask: u32,
    group_mask: u32,
}

impl Acl {
    /// Creates an empty ACL for an object owned by `owner`.
    #[must_use]
    pub const fn new(version: LayoutVersion, owner: Fuid) -> Self {
        Self {
            version,
            entries: Vec::new(),
            byte_size: 0,
            owner,
            hints: ObjectFlags::from_bits(0),
            owner_mask: ACL_NO_MASK,
            group_mask: ACL_NO_MASK,
        }
    }

    /// Decodes a stored ACL.
    ///
    /// Only the ACL-wide bits of `pflags` are kept as hints. The masks are
    /// left unset; call [`Acl::compute_masks`] before evaluating.
    ///
    /// # Errors
    ///
    /// Returns the codec error when any entry fails to decode. No partial
    /// ACL is ever produced.
    pub fn from_stored(
        stored: &StoredAcl,
        owner: Fuid,
        pflags: ObjectFlags,
    ) -> Result<Self, AclCodecError> {
        let entries = decode_acl(stored.version, &stored.bytes, stored.count)?;
        let mut acl = Self::new(stored.version, owner);
        acl.byte_size = stored.bytes.len();
        acl.entries = entries;
        acl.hints = pflags.intersect(ObjectFlags::ACL_WIDE);
        Ok(acl)
    }

    /// Encodes the entries for persistence.
    ///
    /// # Errors
    ///
    /// Fails when an entry cannot be represented in the ACL's layout.
    pub fn to_stored(&self) -> Result<StoredAcl, AclCodecError> {
        let bytes = encode_acl(self.version, &self.entries)?;
        Ok(StoredAcl {
            version: self.version,
            count: self.entries.len(),
            bytes,
        })
    }

    /// Appends an entry after every existing one.
    pub fn append(&mut self, ace: Ace) {
        self.byte_size += ace_size(self.version, ace.ace_type, ace.flags);
        self.entries.push(ace);
    }

    /// Drops every entry.
    pub fn release_all(&mut self) {
        self.entries.clear();
        self.byte_size = 0;
    }

    /// Replaces every entry with `aces`.
    pub(crate) fn replace_entries(&mut self, aces: Vec<Ace>) {
        self.release_all();
        self.entries.reserve(aces.len());
        for ace in aces {
            self.append(ace);
        }
    }

    /// Returns the stored entries without masking.
    #[must_use]
    pub fn aces(&self) -> &[Ace] {
        &self.entries
    }

    /// Returns a masked iterator over the entries.
    #[must_use]
    pub const fn iter(&self) -> AclIter<'_> {
        AclIter {
            acl: self,
            position: 0,
            masked: self.hints.masking(),
        }
    }

    /// Returns an iterator that never applies the masks.
    #[must_use]
    pub const fn iter_unmasked(&self) -> AclIter<'_> {
        AclIter {
            acl: self,
            position: 0,
            masked: false,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the ACL has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encoded size of the entries in bytes.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Layout the ACL is stored in.
    #[must_use]
    pub const fn version(&self) -> LayoutVersion {
        self.version
    }

    /// Composite identity of the object's owner.
    #[must_use]
    pub const fn owner(&self) -> Fuid {
        self.owner
    }

    /// Records a new owner for the object.
    pub const fn set_owner(&mut self, owner: Fuid) {
        self.owner = owner;
    }

    /// ACL-wide hint bits.
    #[must_use]
    pub const fn hints(&self) -> ObjectFlags {
        self.hints
    }

    /// Replaces the hint bits.
    pub const fn set_hints(&mut self, hints: ObjectFlags) {
        self.hints = hints;
    }

    /// Sets hint bits in place.
    pub const fn insert_hints(&mut self, bits: u64) {
        self.hints.insert(bits);
    }

    /// Mask applied to ALLOW entries naming the owner.
    #[must_use]
    pub const fn owner_mask(&self) -> u32 {
        self.owner_mask
    }

    /// Mask applied to other masked ALLOW entries.
    #[must_use]
    pub const fn group_mask(&self) -> u32 {
        self.group_mask
    }

    /// Clears both masks.
    pub const fn clear_masks(&mut self) {
        self.owner_mask = ACL_NO_MASK;
        self.group_mask = ACL_NO_MASK;
    }

    /// Recomputes [`Acl::owner_mask`] and [`Acl::group_mask`].
    ///
    /// Under [`ObjectFlags::ACL_MASK_X`] both masks withhold only execute.
    /// Without [`ObjectFlags::ACL_CHMOD`] both masks are cleared. Otherwise
    /// each mask is what the `owner@` or `group@` entries grant before any
    /// of their denials, skipping inherit-only entries on directories.
    pub fn compute_masks(&mut self, is_dir: bool) {
        if self.hints.contains(ObjectFlags::ACL_MASK_X) {
            self.owner_mask = ACL_NO_MASK & !ACE_EXECUTE;
            self.group_mask = ACL_NO_MASK & !ACE_EXECUTE;
            return;
        }
        if !self.hints.contains(ObjectFlags::ACL_CHMOD) {
            self.clear_masks();
            return;
        }

        let (mut owner_allow, mut owner_deny) = (0u32, 0u32);
        let (mut group_allow, mut group_deny) = (0u32, 0u32);
        for ace in &self.entries {
            let flags = ace.flags;
            if !valid_ace_type(ace.ace_type.as_raw(), flags.as_raw()) {
                continue;
            }
            if is_dir && flags.is_inherit_only() {
                continue;
            }
            let mask = ace.mask.as_raw();
            let (allow, deny) = match flags.identity_class() {
                IdentityClass::Owner => (&mut owner_allow, &mut owner_deny),
                IdentityClass::OwningGroup => (&mut group_allow, &mut group_deny),
                _ => continue,
            };
            match ace.ace_type {
                AceType::Allow => *allow |= mask & !*deny,
                AceType::Deny => *deny |= mask & !*allow,
                _ => {}
            }
        }
        self.owner_mask = owner_allow;
        self.group_mask = group_allow;
        debug_log!(
            Container,
            2,
            "masks recomputed: owner {owner_allow:#x} group {group_allow:#x}"
        );
    }

    /// Rewrites a basic-layout ACL into the extended layout.
    ///
    /// Does nothing when the ACL is already extended.
    ///
    /// # Errors
    ///
    /// Fails when an entry carries an invalid type/flag combination; the ACL
    /// is left untouched in that case.
    pub fn upgrade(&mut self, mapper: Option<UpgradeMapper<'_>>) -> Result<(), AclCodecError> {
        if self.version == LayoutVersion::Extended {
            return Ok(());
        }
        let upgraded = upgrade_acl(&self.entries, mapper)?;
        self.version = LayoutVersion::Extended;
        self.replace_entries(upgraded);
        Ok(())
    }

    fn view(&self, ace: &Ace, masked: bool) -> AceView {
        let mut mask = ace.mask.as_raw();
        if masked && ace.ace_type == AceType::Allow {
            let raw_flags = ace.flags.as_raw();
            let type_flags = raw_flags & ACE_TYPE_FLAGS;
            if raw_flags & ACE_INHERIT_ONLY_ACE == 0
                && (type_flags == 0 || type_flags == ACE_IDENTIFIER_GROUP)
            {
                mask &= if type_flags == 0 && ace.who == self.owner.as_raw() {
                    self.owner_mask
                } else {
                    self.group_mask
                };
            }
        }
        AceView {
            who: ace.who,
            mask: AccessMask::from_raw(mask),
            flags: ace.flags,
            ace_type: ace.ace_type,
            object: ace.object,
        }
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = AceView;
    type IntoIter = AclIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One entry as seen through the masked iterator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AceView {
    /// Identity the entry names.
    pub who: u64,
    /// Effective mask after masking.
    pub mask: AccessMask,
    /// Entry flags.
    pub flags: AceFlags,
    /// Entry type.
    pub ace_type: AceType,
    /// Object GUIDs of object-scoped entries.
    pub object: Option<ObjectGuids>,
}

impl AceView {
    /// Identity class encoded in the flags.
    #[must_use]
    pub const fn identity_class(&self) -> IdentityClass {
        self.flags.identity_class()
    }

    /// Reports whether the type/flag combination is one the engine honours.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        valid_ace_type(self.ace_type.as_raw(), self.flags.as_raw())
    }

    /// Rebuilds an owned entry from the view.
    #[must_use]
    pub fn to_ace(&self) -> Ace {
        let mut ace = Ace::new(
            self.ace_type,
            self.flags.as_raw(),
            self.mask.as_raw(),
            self.who,
        );
        if let Some(guids) = self.object {
            ace = ace.with_object(guids);
        }
        ace
    }
}

/// Forward iterator over the entries of an [`Acl`].
#[derive(Clone, Debug)]
pub struct AclIter<'a> {
    acl: &'a Acl,
    position: usize,
    masked: bool,
}

impl AclIter<'_> {
    /// Starts again from the first entry.
    pub const fn restart(&mut self) {
        self.position = 0;
    }

    /// Reports whether masking is applied.
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.masked
    }
}

impl Iterator for AclIter<'_> {
    type Item = AceView;

    fn next(&mut self) -> Option<Self::Item> {
        let ace = self.acl.entries.get(self.position)?;
        self.position += 1;
        Some(self.acl.view(ace, self.masked))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.acl.entries.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AclIter<'_> {}

impl std::iter::FusedIterator for AclIter<'_> {}

#[cfg(test)]
mod tests;
