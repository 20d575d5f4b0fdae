//! Evaluation of an ACL against a caller's credential.
//!
//! Entries are consulted in order. The first entry that names the caller
//! and mentions a requested bit decides that bit; later entries never
//! revisit it. [`check`] returns the verdict as a value so callers can
//! apply privilege overrides to the bits no entry resolved.

use logging::{debug_log, warn_log};
use protocol::acl::{AceType, CREATOR_OWNER_UID, Fuid, IdType, IdentityClass};

use crate::acl::{Acl, AceView};
use crate::ownership::{Credential, IdentityMapper, MappingUnavailable};

/// How [`check`] treats the first matching ALLOW entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CheckMode {
    /// Resolve every requested bit.
    #[default]
    AllDenied,
    /// Stop at the first ALLOW entry that grants any requested bit.
    AnyAllowed,
}

/// Verdict of [`check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Every requested bit was granted.
    Granted,
    /// An ALLOW entry granted at least one bit under [`CheckMode::AnyAllowed`].
    AnyAllowed,
    /// At least one bit was explicitly denied. Carries the denied bits
    /// together with the bits no entry resolved.
    Denied(u32),
    /// Nothing was denied, but these bits were never granted.
    Unresolved(u32),
}

impl AccessOutcome {
    /// Reports whether the request may proceed without a privilege check.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted | Self::AnyAllowed)
    }

    /// Returns the bits that remain refused.
    #[must_use]
    pub const fn residual(self) -> u32 {
        match self {
            Self::Granted | Self::AnyAllowed => 0,
            Self::Denied(bits) | Self::Unresolved(bits) => bits,
        }
    }
}

/// Who is asking, and about which object.
#[derive(Clone, Copy)]
pub struct AccessRequest<'a> {
    /// Caller credential.
    pub cred: &'a Credential,
    /// Identity mapping used to resolve entry identities.
    pub mapper: &'a dyn IdentityMapper,
    /// Owner of the object.
    pub owner: Fuid,
    /// Owning group of the object.
    pub group: Fuid,
    /// Whether the object is a directory.
    pub is_dir: bool,
}

impl std::fmt::Debug for AccessRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessRequest")
            .field("cred", self.cred)
            .field("owner", &self.owner)
            .field("group", &self.group)
            .field("is_dir", &self.is_dir)
            .finish_non_exhaustive()
    }
}

impl AccessRequest<'_> {
    fn owner_local(&self) -> Option<u32> {
        unavailable_as_none(self.mapper.composite_to_local(self.owner, IdType::User))
    }

    fn matches(&self, view: &AceView, owner: Option<u32>) -> bool {
        match view.identity_class() {
            IdentityClass::Owner => owner == Some(self.cred.uid()),
            IdentityClass::OwningGroup => {
                unavailable_as_none(self.mapper.is_member(self.cred, self.group)).unwrap_or(false)
            }
            IdentityClass::Group => {
                unavailable_as_none(self.mapper.is_member(self.cred, Fuid::from_raw(view.who)))
                    .unwrap_or(false)
            }
            IdentityClass::Everyone => true,
            IdentityClass::User => {
                let mapped = self
                    .mapper
                    .composite_to_local(Fuid::from_raw(view.who), IdType::User);
                unavailable_as_none(mapped)
                    .is_some_and(|uid| uid != CREATOR_OWNER_UID && uid == self.cred.uid())
            }
            IdentityClass::Invalid(_) => false,
        }
    }
}

fn unavailable_as_none<T>(result: Result<T, MappingUnavailable>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn_log!(Idmap, "identity mapping unavailable during access check: {err}");
            #[cfg(feature = "tracing")]
            logging::trace_idmap!(id = err.id, "mapping unavailable");
            None
        }
    }
}

/// Evaluates `requested` access bits against `acl`.
///
/// Masks must already be computed when the ACL carries masking hints.
#[must_use]
pub fn check(acl: &Acl, request: &AccessRequest<'_>, requested: u32, mode: CheckMode) -> AccessOutcome {
    let mut working = requested;
    let mut denied = 0u32;
    let owner = request.owner_local();

    for view in acl.iter() {
        if !view.is_valid() || !view.ace_type.is_allow_or_deny() {
            continue;
        }
        if request.is_dir && view.flags.is_inherit_only() {
            continue;
        }
        let matched = view.mask.as_raw() & working;
        if matched == 0 {
            continue;
        }
        if !request.matches(&view, owner) {
            continue;
        }

        if view.ace_type == AceType::Deny {
            denied |= matched;
        } else if mode == CheckMode::AnyAllowed {
            debug_log!(Access, 2, "uid {} any access via {matched:#x}", request.cred.uid());
            return AccessOutcome::AnyAllowed;
        }
        working &= !matched;
        if working == 0 {
            break;
        }
    }

    let outcome = if denied != 0 {
        AccessOutcome::Denied(working | denied)
    } else if working != 0 {
        AccessOutcome::Unresolved(working)
    } else {
        AccessOutcome::Granted
    };

    debug_log!(
        Access,
        2,
        "uid {} requested {requested:#x}: {outcome:?}",
        request.cred.uid()
    );
    #[cfg(feature = "tracing")]
    logging::trace_access!(uid = request.cred.uid(), requested, ?outcome, "evaluated");

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ObjectFlags;
    use crate::ownership::LocalIdentityMapper;
    use logging::{DiagFlag, DiagnosticEvent, drain_events};
    use protocol::acl::{
        ACE_DIRECTORY_INHERIT_ACE, ACE_EXECUTE, ACE_INHERIT_ONLY_ACE, ACE_READ_DATA,
        ACE_WRITE_DATA, Ace, LayoutVersion,
    };

    const OWNER: u32 = 1000;
    const GROUP: u32 = 100;

    fn acl_of(aces: impl IntoIterator<Item = Ace>) -> Acl {
        let mut acl = Acl::new(LayoutVersion::Extended, Fuid::local(OWNER));
        for ace in aces {
            acl.append(ace);
        }
        acl
    }

    fn run(acl: &Acl, cred: &Credential, requested: u32, mode: CheckMode) -> AccessOutcome {
        let request = AccessRequest {
            cred,
            mapper: &LocalIdentityMapper,
            owner: Fuid::local(OWNER),
            group: Fuid::local(GROUP),
            is_dir: false,
        };
        check(acl, &request, requested, mode)
    }

    #[test]
    fn first_matching_entry_decides_each_bit() {
        let user = Credential::new(2000, 2000);
        let deny_first = acl_of([
            Ace::user(AceType::Deny, 2000, ACE_WRITE_DATA),
            Ace::user(AceType::Allow, 2000, ACE_WRITE_DATA),
        ]);
        assert_eq!(
            run(&deny_first, &user, ACE_WRITE_DATA, CheckMode::AllDenied),
            AccessOutcome::Denied(ACE_WRITE_DATA)
        );

        let allow_first = acl_of([
            Ace::user(AceType::Allow, 2000, ACE_WRITE_DATA),
            Ace::user(AceType::Deny, 2000, ACE_WRITE_DATA),
        ]);
        assert_eq!(
            run(&allow_first, &user, ACE_WRITE_DATA, CheckMode::AllDenied),
            AccessOutcome::Granted
        );
    }

    #[test]
    fn denied_result_includes_unresolved_bits() {
        let acl = acl_of([Ace::everyone(AceType::Deny, ACE_WRITE_DATA)]);
        let cred = Credential::new(3000, 3000);
        assert_eq!(
            run(&acl, &cred, ACE_READ_DATA | ACE_WRITE_DATA, CheckMode::AllDenied),
            AccessOutcome::Denied(ACE_READ_DATA | ACE_WRITE_DATA)
        );
    }

    #[test]
    fn any_allowed_stops_at_the_first_grant() {
        let acl = acl_of([
            Ace::user(AceType::Allow, 2000, ACE_READ_DATA),
            Ace::user(AceType::Deny, 2000, ACE_READ_DATA | ACE_WRITE_DATA),
        ]);
        let user = Credential::new(2000, 2000);
        assert_eq!(
            run(&acl, &user, ACE_READ_DATA | ACE_WRITE_DATA, CheckMode::AnyAllowed),
            AccessOutcome::AnyAllowed
        );
        assert_eq!(
            run(&acl, &user, ACE_READ_DATA | ACE_WRITE_DATA, CheckMode::AllDenied),
            AccessOutcome::Denied(ACE_WRITE_DATA)
        );
    }

    #[test]
    fn owner_group_and_everyone_scenario() {
        let acl = acl_of([
            Ace::owner(AceType::Allow, ACE_READ_DATA | ACE_WRITE_DATA),
            Ace::owning_group(AceType::Allow, ACE_READ_DATA),
            Ace::everyone(AceType::Deny, ACE_WRITE_DATA),
        ]);

        let owner = Credential::new(OWNER, GROUP);
        assert!(run(&acl, &owner, ACE_WRITE_DATA, CheckMode::AllDenied).is_granted());

        let member = Credential::new(2000, 2000).with_groups([GROUP]);
        let outcome = run(&acl, &member, ACE_WRITE_DATA, CheckMode::AllDenied);
        assert!(!outcome.is_granted());
        assert_eq!(outcome.residual(), ACE_WRITE_DATA);
        assert!(run(&acl, &member, ACE_READ_DATA, CheckMode::AllDenied).is_granted());

        let stranger = Credential::new(3000, 3000);
        assert_eq!(
            run(&acl, &stranger, ACE_READ_DATA, CheckMode::AllDenied),
            AccessOutcome::Unresolved(ACE_READ_DATA)
        );
    }

    #[test]
    fn named_group_entries_match_supplementary_groups() {
        let acl = acl_of([Ace::group(AceType::Allow, 500, ACE_EXECUTE)]);
        let member = Credential::new(2000, 2000).with_groups([7, 500]);
        assert!(run(&acl, &member, ACE_EXECUTE, CheckMode::AllDenied).is_granted());
        let outsider = Credential::new(2000, 2000);
        assert_eq!(
            run(&acl, &outsider, ACE_EXECUTE, CheckMode::AllDenied),
            AccessOutcome::Unresolved(ACE_EXECUTE)
        );
    }

    #[test]
    fn creator_owner_placeholder_never_matches() {
        let acl = acl_of([Ace::user(
            AceType::Allow,
            u64::from(CREATOR_OWNER_UID),
            ACE_READ_DATA,
        )]);
        let cred = Credential::new(CREATOR_OWNER_UID, 0);
        assert_eq!(
            run(&acl, &cred, ACE_READ_DATA, CheckMode::AllDenied),
            AccessOutcome::Unresolved(ACE_READ_DATA)
        );
    }

    #[test]
    fn inherit_only_entries_do_not_apply_to_the_directory() {
        let acl = acl_of([Ace::everyone(AceType::Deny, ACE_READ_DATA)
            .with_flags(ACE_DIRECTORY_INHERIT_ACE | ACE_INHERIT_ONLY_ACE)]);
        let cred = Credential::new(2000, 2000);
        let request = AccessRequest {
            cred: &cred,
            mapper: &LocalIdentityMapper,
            owner: Fuid::local(OWNER),
            group: Fuid::local(GROUP),
            is_dir: true,
        };
        assert_eq!(
            check(&acl, &request, ACE_READ_DATA, CheckMode::AllDenied),
            AccessOutcome::Unresolved(ACE_READ_DATA)
        );
    }

    #[test]
    fn audit_entries_are_ignored() {
        let acl = acl_of([
            Ace::everyone(AceType::Audit, ACE_READ_DATA),
            Ace::everyone(AceType::Allow, ACE_READ_DATA),
        ]);
        let cred = Credential::new(2000, 2000);
        assert!(run(&acl, &cred, ACE_READ_DATA, CheckMode::AllDenied).is_granted());
    }

    #[test]
    fn masked_view_is_used_for_evaluation() {
        let mut acl = acl_of([
            Ace::user(AceType::Allow, 2000, ACE_READ_DATA | ACE_WRITE_DATA),
            Ace::owning_group(AceType::Allow, ACE_READ_DATA),
        ]);
        acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));
        acl.compute_masks(false);
        let user = Credential::new(2000, 2000);
        assert_eq!(
            run(&acl, &user, ACE_WRITE_DATA, CheckMode::AllDenied),
            AccessOutcome::Unresolved(ACE_WRITE_DATA)
        );
    }

    #[test]
    fn mapping_outage_is_a_non_match_with_a_warning() {
        drain_events();
        let foreign = Fuid::new(3, 77);
        let acl = acl_of([
            Ace::user(AceType::Deny, foreign.as_raw(), ACE_READ_DATA),
            Ace::everyone(AceType::Allow, ACE_READ_DATA),
        ]);
        let cred = Credential::new(77, 77);
        assert!(run(&acl, &cred, ACE_READ_DATA, CheckMode::AllDenied).is_granted());

        let warnings: Vec<_> = drain_events()
            .into_iter()
            .filter(|event| {
                matches!(event, DiagnosticEvent::Warning { flag: DiagFlag::Idmap, .. })
            })
            .collect();
        assert_eq!(warnings.len(), 1);
    }
}
