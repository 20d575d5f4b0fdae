//! Inheritance of a directory's entries into new objects.
//!
//! [`inherit`] copies the entries of a parent ACL that apply to a new
//! child and reports whether the requested mode still has to be folded in.
//! [`new_object_acl`] runs the complete sequence for an object being
//! created: inherit or start from a trivial ACL, fold in the mode when
//! needed, then derive the final mode word and hints.

use logging::debug_log;
use protocol::acl::{
    ACE_DIRECTORY_INHERIT_ACE, ACE_EVERYONE, ACE_EXECUTE, ACE_FILE_INHERIT_ACE,
    ACE_INHERIT_ONLY_ACE, ACE_INHERITED_ACE, ACE_NO_PROPAGATE_INHERIT_ACE, ACE_OWNER,
    ACE_WRITE_ACL, ACE_WRITE_OWNER, ALL_INHERIT, Ace, AceFlags, AceType, Fuid, OWNING_GROUP,
    valid_ace_type,
};

use crate::acl::Acl;
use crate::flags::ObjectFlags;
use crate::mode::{S_IXGRP, S_IXOTH, S_IXUSR, acl_from_mode, is_trivial, mode_from_acl};
use crate::options::{AclInherit, AclMode, AclOptions};
use crate::store::{ObjectAttrs, ObjectType};

/// Grants removed from inherited ALLOW entries under [`AclInherit::Restricted`].
pub const RESTRICTED_CLEAR: u32 = ACE_WRITE_ACL | ACE_WRITE_OWNER;

/// Reports whether an entry with `flags` is inherited by a child of `child`.
///
/// Directories take entries marked directory-inherit, and file-inherit
/// entries unless no-propagate is set. Everything else takes only
/// file-inherit entries.
#[must_use]
pub const fn can_inherit(child: ObjectType, flags: AceFlags) -> bool {
    let iflags = flags.as_raw() & 0xf;
    if child.is_dir() && iflags & ACE_DIRECTORY_INHERIT_ACE != 0 {
        return true;
    }
    if iflags & ACE_FILE_INHERIT_ACE != 0 {
        return !(child.is_dir() && iflags & ACE_NO_PROPAGATE_INHERIT_ACE != 0);
    }
    false
}

fn restricted_update(options: &AclOptions, ace: &mut Ace) {
    if options.inherit_policy() == AclInherit::Restricted && ace.ace_type == AceType::Allow {
        ace.mask = ace.mask.without(RESTRICTED_CLEAR);
    }
}

/// Result of [`inherit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InheritedAcl {
    /// ACL for the new object. Masks are left unset.
    pub acl: Acl,
    /// The requested mode must still be folded in with
    /// [`acl_from_mode`].
    pub need_chmod: bool,
}

/// Builds the ACL a new `child` inherits from `parent`.
///
/// `mode` is the requested mode of the child; `owner` its owner.
#[must_use]
pub fn inherit(
    options: &AclOptions,
    parent: &Acl,
    child: ObjectType,
    mode: u32,
    owner: Fuid,
) -> InheritedAcl {
    let policy = options.inherit_policy();
    let is_dir = child.is_dir();
    let passthrough_x = policy == AclInherit::PassthroughX;
    let strip_exec = passthrough_x && !is_dir && mode & (S_IXUSR | S_IXGRP | S_IXOTH) == 0;
    let passthrough = passthrough_x || policy == AclInherit::Passthrough;
    let noallow = policy == AclInherit::NoAllow;
    let mask_or_passthrough = matches!(options.mode_policy(), AclMode::Mask | AclMode::Passthrough);

    let mut need_chmod = true;
    let mut acl = Acl::new(parent.version(), owner);
    if policy == AclInherit::Discard || child == ObjectType::Symlink {
        return InheritedAcl { acl, need_chmod };
    }

    for parent_ace in parent.aces() {
        let iflags = parent_ace.flags.as_raw();
        if !valid_ace_type(parent_ace.ace_type.as_raw(), iflags) {
            continue;
        }
        if noallow && parent_ace.ace_type == AceType::Allow {
            continue;
        }
        if !can_inherit(child, parent_ace.flags) {
            continue;
        }

        if passthrough
            && (iflags & (ACE_OWNER | ACE_EVERYONE) != 0 || iflags & OWNING_GROUP == OWNING_GROUP)
            && (child.is_regular() || (is_dir && iflags & ACE_DIRECTORY_INHERIT_ACE != 0))
        {
            need_chmod = false;
        }

        let mut ace = parent_ace.clone();
        if strip_exec
            && ace.ace_type == AceType::Allow
            && ((mask_or_passthrough && ace.is_special())
                || options.mode_policy() == AclMode::Discard)
        {
            ace.mask = ace.mask.without(ACE_EXECUTE);
        }

        if is_dir {
            acl.insert_hints(ObjectFlags::INHERIT_ACE);
        }

        let mut flags = ace.flags.with(ACE_INHERITED_ACE);
        if iflags & ACE_NO_PROPAGATE_INHERIT_ACE != 0 || !is_dir {
            flags = flags.without(ALL_INHERIT).with(ACE_INHERITED_ACE);
            ace.flags = flags;
            restricted_update(options, &mut ace);
        } else if iflags & (ACE_FILE_INHERIT_ACE | ACE_DIRECTORY_INHERIT_ACE)
            == ACE_FILE_INHERIT_ACE
        {
            ace.flags = flags.with(ACE_INHERIT_ONLY_ACE);
        } else {
            ace.flags = flags.without(ACE_INHERIT_ONLY_ACE);
            restricted_update(options, &mut ace);
        }
        acl.append(ace);
    }

    if need_chmod && !passthrough && options.mode_policy() != AclMode::Passthrough {
        acl.insert_hints(ObjectFlags::ACL_CHMOD);
    }
    if strip_exec {
        acl.insert_hints(ObjectFlags::ACL_MASK_X);
    }
    acl.clear_masks();

    debug_log!(
        Inherit,
        1,
        "{child:?} inherited {} of {} entries under {policy}, need_chmod {need_chmod}",
        acl.len(),
        parent.len()
    );
    #[cfg(feature = "tracing")]
    logging::trace_inherit!(
        inherited = acl.len(),
        parent = parent.len(),
        need_chmod,
        "inherit"
    );

    InheritedAcl { acl, need_chmod }
}

/// Identity and requested mode of an object being created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewObject {
    /// Kind of the new object.
    pub object_type: ObjectType,
    /// Requested mode, including type and set-id bits.
    pub mode: u32,
    /// Owner of the new object.
    pub owner: Fuid,
    /// Owning group of the new object.
    pub group: Fuid,
}

/// ACL, mode word and hints of a new object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewObjectAcl {
    /// ACL to persist. Its hints become the object's ACL-wide flags.
    pub acl: Acl,
    /// Final mode word.
    pub mode: u32,
    /// Whether any entry came from the parent.
    pub inherited: bool,
}

/// Derives the ACL of a new object created in the directory `parent_attrs`.
///
/// An `explicit` ACL supplied by the caller replaces inheritance entirely.
/// Otherwise the parent's inheritable entries are used when it has any,
/// and a trivial ACL for the requested mode when it has none.
#[must_use]
pub fn new_object_acl(
    options: &AclOptions,
    parent: &Acl,
    parent_attrs: &ObjectAttrs,
    object: &NewObject,
    explicit: Option<Acl>,
) -> NewObjectAcl {
    if explicit.is_some() {
        return derive(options, object, explicit, None);
    }
    let inherits = parent_attrs.is_dir()
        && parent_attrs.pflags.contains(ObjectFlags::INHERIT_ACE)
        && !parent_attrs.pflags.contains(ObjectFlags::XATTR);
    let inherited = inherits.then(|| {
        inherit(
            options,
            parent,
            object.object_type,
            object.mode,
            object.owner,
        )
    });
    derive(options, object, None, inherited)
}

/// Derives the ACL of an object that has no parent, such as the root of a
/// filesystem.
#[must_use]
pub fn root_object_acl(options: &AclOptions, object: &NewObject) -> NewObjectAcl {
    derive(options, object, None, None)
}

fn derive(
    options: &AclOptions,
    object: &NewObject,
    explicit: Option<Acl>,
    inherited: Option<InheritedAcl>,
) -> NewObjectAcl {
    let is_dir = object.object_type.is_dir();
    let supplied = explicit.is_some();
    let from_parent = inherited.is_some();

    let mut acl = if let Some(acl) = explicit {
        acl
    } else {
        let (mut acl, need_chmod) = if let Some(result) = inherited {
            (result.acl, result.need_chmod)
        } else {
            let mut acl = Acl::new(options.layout(), object.owner);
            acl.insert_hints(if options.mode_policy() == AclMode::Passthrough {
                ObjectFlags::ACL_TRIVIAL
            } else {
                ObjectFlags::ACL_TRIVIAL | ObjectFlags::ACL_CHMOD
            });
            (acl, true)
        };
        if need_chmod {
            if is_dir {
                acl.insert_hints(ObjectFlags::ACL_AUTO_INHERIT);
            }
            acl_from_mode(&mut acl, is_dir, object.mode, options);
        }
        acl.compute_masks(is_dir);
        acl
    };

    let summary = mode_from_acl(&acl, object.mode, object.owner, object.group);
    let mut hints = acl.hints();
    summary.apply_to(&mut hints);
    if (from_parent || supplied) && is_trivial(&acl) {
        hints.insert(ObjectFlags::ACL_TRIVIAL);
    }
    acl.set_hints(hints);

    debug_log!(
        Mode,
        2,
        "new {:?}: mode {:o}, {} entries, hints {:#x}",
        object.object_type,
        summary.mode,
        acl.len(),
        hints
    );

    NewObjectAcl {
        acl,
        mode: summary.mode,
        inherited: from_parent,
    }
}
