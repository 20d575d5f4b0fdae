//! Keeps the mode word and the ACL consistent.
//!
//! [`mode_from_acl`] derives the permission bits a POSIX tool should see
//! for an ACL. [`acl_from_mode`] rewrites an ACL so it grants what a mode
//! word grants, and [`chmod_acl`] wraps it with the `aclmode` policy.

use logging::debug_log;
use protocol::acl::{
    ACE_APPEND_DATA, ACE_DELETE, ACE_DELETE_CHILD, ACE_DIRECTORY_INHERIT_ACE, ACE_EXECUTE,
    ACE_FILE_INHERIT_ACE, ACE_INHERIT_ONLY_ACE, ACE_READ_ACL, ACE_READ_ATTRIBUTES, ACE_READ_DATA,
    ACE_READ_NAMED_ATTRS, ACE_SYNCHRONIZE, ACE_WRITE_ACL, ACE_WRITE_ATTRIBUTES, ACE_WRITE_DATA,
    ACE_WRITE_NAMED_ATTRS, ACE_WRITE_OWNER, ALL_INHERIT, AccessMask, Ace, AceType, Fuid,
    IdentityClass,
};

use crate::acl::Acl;
use crate::flags::ObjectFlags;
use crate::options::{AclInherit, AclMode, AclOptions};

/// File type mask.
pub const S_IFMT: u32 = 0o170_000;
/// Directory.
pub const S_IFDIR: u32 = 0o040_000;
/// Regular file.
pub const S_IFREG: u32 = 0o100_000;
/// Symbolic link.
pub const S_IFLNK: u32 = 0o120_000;
/// Set user id on execution.
pub const S_ISUID: u32 = 0o4000;
/// Set group id on execution; inherited by new directories.
pub const S_ISGID: u32 = 0o2000;
/// Sticky bit.
pub const S_ISVTX: u32 = 0o1000;

/// Owner read.
pub const S_IRUSR: u32 = 0o400;
/// Owner write.
pub const S_IWUSR: u32 = 0o200;
/// Owner execute.
pub const S_IXUSR: u32 = 0o100;
/// Group read.
pub const S_IRGRP: u32 = 0o040;
/// Group write.
pub const S_IWGRP: u32 = 0o020;
/// Group execute.
pub const S_IXGRP: u32 = 0o010;
/// Other read.
pub const S_IROTH: u32 = 0o004;
/// Other write.
pub const S_IWOTH: u32 = 0o002;
/// Other execute.
pub const S_IXOTH: u32 = 0o001;

const ALL_MODE_EXECS: u32 = S_IXUSR | S_IXGRP | S_IXOTH;

/// Access every identity holds in an ACL derived from a mode word.
pub const EVERYONE_ALLOW_MASK: u32 =
    ACE_READ_ACL | ACE_READ_ATTRIBUTES | ACE_READ_NAMED_ATTRS | ACE_SYNCHRONIZE;
/// Additional access only the owner holds in an ACL derived from a mode word.
pub const OWNER_ALLOW_MASK: u32 =
    ACE_WRITE_ACL | ACE_WRITE_OWNER | ACE_WRITE_ATTRIBUTES | ACE_WRITE_NAMED_ATTRS;

/// Converts three `rwx` bits (in the "other" position) to an access mask.
#[must_use]
pub const fn unix_to_v4(rwx: u32) -> u32 {
    let mut mask = 0;
    if rwx & S_IXOTH != 0 {
        mask |= ACE_EXECUTE;
    }
    if rwx & S_IWOTH != 0 {
        mask |= ACE_WRITE_DATA;
    }
    if rwx & S_IROTH != 0 {
        mask |= ACE_READ_DATA;
    }
    mask
}

/// Entry masks of the canonical ACL for a mode word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrivialMasks {
    /// Extra owner grant placed first, needed when "other" holds a bit the
    /// group does not.
    pub allow0: u32,
    /// Bits denied to the owner ahead of the group and everyone grants.
    pub deny1: u32,
    /// Bits denied to the owning group ahead of the everyone grant.
    pub deny2: u32,
    /// Trailing `owner@` grant.
    pub owner: u32,
    /// Trailing `group@` grant.
    pub group: u32,
    /// Trailing `everyone@` grant.
    pub everyone: u32,
}

/// Computes the canonical entry masks for `mode`.
#[must_use]
pub const fn trivial_access_masks(mode: u32, is_dir: bool) -> TrivialMasks {
    let read = ACE_READ_DATA;
    let write = if is_dir {
        ACE_WRITE_DATA | ACE_APPEND_DATA | ACE_DELETE_CHILD
    } else {
        ACE_WRITE_DATA | ACE_APPEND_DATA
    };
    let exec = ACE_EXECUTE;
    let triples = [
        (read, S_IRUSR, S_IRGRP, S_IROTH),
        (write, S_IWUSR, S_IWGRP, S_IWOTH),
        (exec, S_IXUSR, S_IXGRP, S_IXOTH),
    ];

    let mut masks = TrivialMasks {
        allow0: 0,
        deny1: 0,
        deny2: 0,
        owner: OWNER_ALLOW_MASK | EVERYONE_ALLOW_MASK,
        group: EVERYONE_ALLOW_MASK,
        everyone: EVERYONE_ALLOW_MASK,
    };
    let mut i = 0;
    while i < triples.len() {
        let (bits, usr, grp, oth) = triples[i];
        let (has_usr, has_grp, has_oth) = (mode & usr != 0, mode & grp != 0, mode & oth != 0);
        if !has_usr && (has_grp || has_oth) {
            masks.deny1 |= bits;
        }
        if !has_grp && has_oth {
            masks.deny2 |= bits;
        }
        if has_usr && !has_grp && has_oth {
            masks.allow0 |= bits;
        }
        if has_usr {
            masks.owner |= bits;
        }
        if has_grp {
            masks.group |= bits;
        }
        if has_oth {
            masks.everyone |= bits;
        }
        i += 1;
    }
    masks
}

/// Reports whether the ACL says nothing beyond what a mode word can say.
#[must_use]
pub fn is_trivial(acl: &Acl) -> bool {
    acl.aces().iter().all(|ace| {
        let flags = ace.flags.as_raw();
        let mask = ace.mask.as_raw();
        let special = matches!(
            ace.identity_class(),
            IdentityClass::Owner | IdentityClass::OwningGroup | IdentityClass::Everyone
        );
        let inheritable =
            flags & (ACE_FILE_INHERIT_ACE | ACE_DIRECTORY_INHERIT_ACE | ACE_INHERIT_ONLY_ACE) != 0;
        let denies_basic_reads =
            ace.ace_type == AceType::Deny && mask & (ACE_READ_ACL | ACE_READ_ATTRIBUTES) != 0;
        let delete_child_without_write =
            mask & ACE_DELETE_CHILD != 0 && mask & ACE_WRITE_DATA == 0;
        let non_owner_admin = ace.ace_type == AceType::Allow
            && ace.identity_class() != IdentityClass::Owner
            && mask & OWNER_ALLOW_MASK != 0;

        special
            && !inheritable
            && !denies_basic_reads
            && mask & ACE_DELETE == 0
            && !delete_child_without_write
            && !non_owner_admin
    })
}

/// Mode word derived from an ACL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeSummary {
    /// File type, set-id and sticky bits of the input plus the derived
    /// permission bits.
    pub mode: u32,
    /// No entry denies execute, so execute checks may use the mode word.
    pub no_execs_denied: bool,
}

impl ModeSummary {
    /// Records [`ModeSummary::no_execs_denied`] in `pflags`.
    pub const fn apply_to(self, pflags: &mut ObjectFlags) {
        pflags.set(ObjectFlags::NO_EXECS_DENIED, self.no_execs_denied);
    }
}

#[derive(Default)]
struct SeenBits {
    seen: u32,
    mode: u32,
}

impl SeenBits {
    fn note(&mut self, bit: u32, allow: bool) {
        if self.seen & bit == 0 {
            self.seen |= bit;
            if allow {
                self.mode |= bit;
            }
        }
    }

    fn note_class(&mut self, mask: u32, bits: (u32, u32, u32), allow: bool) {
        let (r, w, x) = bits;
        if mask & ACE_READ_DATA != 0 {
            self.note(r, allow);
        }
        if mask & ACE_WRITE_DATA != 0 {
            self.note(w, allow);
        }
        if mask & ACE_EXECUTE != 0 {
            self.note(x, allow);
        }
    }
}

/// Derives the mode word implied by `acl`.
///
/// The first entry mentioning read, write or execute for a class decides
/// that bit. `everyone@` decides every class not decided yet. Entries for
/// other users and groups only matter when they deny execute.
#[must_use]
pub fn mode_from_acl(acl: &Acl, fmode: u32, owner: Fuid, group: Fuid) -> ModeSummary {
    const USR: (u32, u32, u32) = (S_IRUSR, S_IWUSR, S_IXUSR);
    const GRP: (u32, u32, u32) = (S_IRGRP, S_IWGRP, S_IXGRP);
    const OTH: (u32, u32, u32) = (S_IROTH, S_IWOTH, S_IXOTH);

    let mut bits = SeenBits::default();
    let mut exec_denied = false;

    for view in acl {
        if !view.is_valid() {
            continue;
        }
        let allow = match view.ace_type {
            AceType::Allow => true,
            AceType::Deny => false,
            _ => continue,
        };
        let class = view.identity_class();
        let special = matches!(
            class,
            IdentityClass::Owner | IdentityClass::OwningGroup | IdentityClass::Everyone
        );
        if special && view.flags.is_inherit_only() {
            continue;
        }
        let mask = view.mask.as_raw();
        match class {
            IdentityClass::Owner => bits.note_class(mask, USR, allow),
            IdentityClass::User if view.who == owner.as_raw() => {
                bits.note_class(mask, USR, allow);
            }
            IdentityClass::OwningGroup => bits.note_class(mask, GRP, allow),
            IdentityClass::Group if view.who == group.as_raw() => {
                bits.note_class(mask, GRP, allow);
            }
            IdentityClass::Everyone => {
                bits.note_class(mask, USR, allow);
                bits.note_class(mask, GRP, allow);
                bits.note_class(mask, OTH, allow);
            }
            _ => {
                if mask & ACE_EXECUTE != 0 && !allow {
                    exec_denied = true;
                }
            }
        }
    }

    if bits.seen & ALL_MODE_EXECS != ALL_MODE_EXECS || bits.mode & ALL_MODE_EXECS != ALL_MODE_EXECS
    {
        exec_denied = true;
    }

    ModeSummary {
        mode: (fmode & (S_IFMT | S_ISUID | S_ISGID | S_ISVTX)) | bits.mode,
        no_execs_denied: !exec_denied,
    }
}

/// Rewrites `acl` so that it grants what `mode` grants.
///
/// The result starts with the owner and group denials the mode needs,
/// keeps every prior entry that still has a role, and ends with the three
/// `owner@`, `group@` and `everyone@` grants. Prior `owner@`, `group@` and
/// `everyone@` entries survive only as inherit-only entries on directories.
pub fn acl_from_mode(acl: &mut Acl, is_dir: bool, mode: u32, options: &AclOptions) {
    let masks = trivial_access_masks(mode, is_dir);
    let clamp = options.inherit_policy() == AclInherit::Restricted
        && options.mode_policy() == AclMode::Discard;
    let fowner = acl.owner().as_raw();

    let mut rebuilt = Vec::with_capacity(acl.len() + 6);
    if masks.allow0 != 0 {
        rebuilt.push(Ace::owner(AceType::Allow, masks.allow0));
    }
    if masks.deny1 != 0 {
        rebuilt.push(Ace::owner(AceType::Deny, masks.deny1));
    }
    if masks.deny2 != 0 {
        rebuilt.push(Ace::owning_group(AceType::Deny, masks.deny2));
    }

    let mut object_aces = false;
    for ace in acl.aces() {
        let inherit_flags = ace.flags.as_raw() & ALL_INHERIT;
        let mut flags = ace.flags;

        if ace.is_special() && inherit_flags & ACE_INHERIT_ONLY_ACE == 0 {
            if is_dir && inherit_flags & (ACE_FILE_INHERIT_ACE | ACE_DIRECTORY_INHERIT_ACE) != 0 {
                flags = flags.with(ACE_INHERIT_ONLY_ACE);
            } else if ace.ace_type.is_allow_or_deny() {
                continue;
            }
        }

        let mut mask = ace.mask.as_raw();
        if !ace.ace_type.is_allow_or_deny() || inherit_flags & ACE_INHERIT_ONLY_ACE != 0 {
            object_aces |= ace.ace_type.is_object();
        } else if ace.ace_type == AceType::Allow && clamp {
            mask &= if ace.who == fowner {
                masks.owner
            } else {
                masks.group
            };
        }

        let mut copy = ace.clone();
        copy.flags = flags;
        copy.mask = AccessMask::from_raw(mask);
        rebuilt.push(copy);
    }

    rebuilt.push(Ace::owner(AceType::Allow, masks.owner));
    rebuilt.push(Ace::owning_group(AceType::Allow, masks.group));
    rebuilt.push(Ace::everyone(AceType::Allow, masks.everyone));

    if object_aces {
        acl.insert_hints(ObjectFlags::ACL_OBJ_ACE);
    }
    debug_log!(
        Mode,
        1,
        "mode {:o} folded into ACL: {} -> {} entries",
        mode & 0o7777,
        acl.len(),
        rebuilt.len()
    );
    acl.replace_entries(rebuilt);
}

/// Produces the ACL an object gets when its mode changes to `mode`.
///
/// Under [`AclMode::Discard`] the new ACL starts empty and keeps only the
/// caller-settable ACL flags of `pflags`; otherwise it starts from
/// `current`. Masking is enabled unless the policy is
/// [`AclMode::Passthrough`].
#[must_use]
pub fn chmod_acl(
    options: &AclOptions,
    current: Acl,
    pflags: ObjectFlags,
    is_dir: bool,
    mode: u32,
) -> Acl {
    let chmod_hint = if options.mode_policy() == AclMode::Passthrough {
        0
    } else {
        ObjectFlags::ACL_CHMOD
    };

    let mut acl = if options.mode_policy() == AclMode::Discard {
        let mut fresh = Acl::new(options.layout(), current.owner());
        fresh.set_hints(pflags.intersect(ObjectFlags::V4_ACL_WIDE).with(chmod_hint));
        fresh
    } else {
        let mut kept = current;
        kept.set_hints(
            pflags
                .intersect(ObjectFlags::ACL_WIDE & !(ObjectFlags::ACL_CHMOD | ObjectFlags::ACL_MASK_X))
                .with(chmod_hint),
        );
        kept
    };

    acl_from_mode(&mut acl, is_dir, mode, options);
    acl.compute_masks(is_dir);
    acl
}
