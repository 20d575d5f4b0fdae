use super::*;
use proptest::prelude::*;
use protocol::acl::{
    ACE_APPEND_DATA, ACE_DIRECTORY_INHERIT_ACE, ACE_FILE_INHERIT_ACE, ACE_READ_DATA,
    ACE_WRITE_DATA, BASIC_ACE_SIZE, EXTENDED_ACE_HEADER_SIZE, EXTENDED_ACE_SIZE, UID_NOBODY,
};

const OWNER: Fuid = Fuid::local(1000);

fn sample() -> Acl {
    let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
    acl.append(Ace::owner(AceType::Deny, ACE_WRITE_DATA));
    acl.append(Ace::user(AceType::Allow, 2000, ACE_READ_DATA | ACE_WRITE_DATA));
    acl.append(Ace::owner(AceType::Allow, ACE_READ_DATA | ACE_WRITE_DATA | ACE_EXECUTE));
    acl.append(Ace::owning_group(AceType::Allow, ACE_READ_DATA | ACE_EXECUTE));
    acl.append(Ace::everyone(AceType::Allow, ACE_READ_DATA));
    acl
}

#[test]
fn append_tracks_count_and_size() {
    let acl = sample();
    assert_eq!(acl.len(), 5);
    assert_eq!(acl.byte_size(), 4 * EXTENDED_ACE_HEADER_SIZE + EXTENDED_ACE_SIZE);
    assert_eq!(acl.owner_mask(), ACL_NO_MASK);
}

#[test]
fn release_all_empties_the_acl() {
    let mut acl = sample();
    acl.release_all();
    assert!(acl.is_empty());
    assert_eq!(acl.byte_size(), 0);
    assert_eq!(acl.iter().count(), 0);
}

#[test]
fn stored_round_trip_keeps_order_and_hints() {
    let acl = sample();
    let stored = acl.to_stored().expect("encodable");
    assert_eq!(stored.count, 5);
    assert_eq!(stored.bytes.len(), acl.byte_size());

    let pflags = ObjectFlags::from_bits(
        ObjectFlags::ACL_CHMOD | ObjectFlags::NO_EXECS_DENIED | ObjectFlags::IMMUTABLE,
    );
    let back = Acl::from_stored(&stored, OWNER, pflags).expect("decodes");
    assert_eq!(back.aces(), acl.aces());
    assert_eq!(back.byte_size(), acl.byte_size());
    assert_eq!(back.hints().bits(), ObjectFlags::ACL_CHMOD);
}

#[test]
fn corrupt_store_yields_no_acl() {
    let mut stored = sample().to_stored().expect("encodable");
    stored.count += 1;
    assert!(Acl::from_stored(&stored, OWNER, ObjectFlags::default()).is_err());
}

#[test]
fn iteration_is_restartable() {
    let acl = sample();
    let mut iter = acl.iter();
    assert_eq!(iter.len(), 5);
    let first = iter.next().expect("entry");
    assert_eq!(iter.by_ref().count(), 4);
    assert!(iter.next().is_none());
    iter.restart();
    assert_eq!(iter.next(), Some(first));
}

#[test]
fn masks_are_only_applied_when_hinted() {
    let mut acl = sample();
    acl.compute_masks(false);
    assert_eq!(acl.group_mask(), ACL_NO_MASK);
    assert!(!acl.iter().is_masked());

    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));
    acl.compute_masks(false);
    assert_eq!(acl.owner_mask(), ACE_READ_DATA | ACE_EXECUTE);
    assert_eq!(acl.group_mask(), ACE_READ_DATA | ACE_EXECUTE);

    let views: Vec<AceView> = acl.iter().collect();
    assert_eq!(views[1].mask.as_raw(), ACE_READ_DATA);
    assert_eq!(
        views[2].mask.as_raw(),
        ACE_READ_DATA | ACE_WRITE_DATA | ACE_EXECUTE,
        "owner@ entries are never masked"
    );
    let raw: Vec<AceView> = acl.iter_unmasked().collect();
    assert_eq!(raw[1].mask.as_raw(), ACE_READ_DATA | ACE_WRITE_DATA);
}

#[test]
fn owner_deny_before_allow_removes_the_bit() {
    let mut acl = sample();
    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));
    acl.compute_masks(false);
    assert_eq!(acl.owner_mask() & ACE_WRITE_DATA, 0);
}

#[test]
fn plain_entry_naming_the_owner_uses_the_owner_mask() {
    let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
    acl.append(Ace::user(AceType::Allow, OWNER.as_raw(), ACE_READ_DATA | ACE_WRITE_DATA));
    acl.append(Ace::owner(AceType::Allow, ACE_WRITE_DATA));
    acl.append(Ace::owning_group(AceType::Allow, ACE_READ_DATA));
    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));
    acl.compute_masks(false);

    let first = acl.iter().next().expect("entry");
    assert_eq!(first.mask.as_raw(), ACE_WRITE_DATA);
}

#[test]
fn inherit_only_entries_are_neither_masked_nor_counted_on_directories() {
    let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
    acl.append(
        Ace::owner(AceType::Allow, ACE_APPEND_DATA)
            .with_flags(ACE_FILE_INHERIT_ACE | ACE_INHERIT_ONLY_ACE),
    );
    acl.append(
        Ace::user(AceType::Allow, 2000, ACE_READ_DATA)
            .with_flags(ACE_DIRECTORY_INHERIT_ACE | ACE_INHERIT_ONLY_ACE),
    );
    acl.append(Ace::owner(AceType::Allow, ACE_READ_DATA));
    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));

    acl.compute_masks(true);
    assert_eq!(acl.owner_mask(), ACE_READ_DATA);
    assert_eq!(acl.group_mask(), 0);
    assert_eq!(acl.iter().nth(1).expect("entry").mask.as_raw(), ACE_READ_DATA);

    acl.compute_masks(false);
    assert_eq!(acl.owner_mask(), ACE_READ_DATA | ACE_APPEND_DATA);
}

#[test]
fn mask_x_withholds_only_execute() {
    let mut acl = sample();
    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_MASK_X));
    acl.compute_masks(false);
    assert_eq!(acl.owner_mask(), !ACE_EXECUTE);
    assert_eq!(acl.group_mask(), !ACE_EXECUTE);
}

#[test]
fn deny_entries_pass_through_the_iterator_unmasked() {
    let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
    acl.append(Ace::user(AceType::Deny, 2000, ACE_WRITE_DATA));
    acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_MASK_X));
    acl.compute_masks(false);
    assert_eq!(acl.iter().next().expect("entry").mask.as_raw(), ACE_WRITE_DATA);
}

#[test]
fn upgrade_moves_basic_entries_to_extended() {
    let mut acl = Acl::new(LayoutVersion::Basic, OWNER);
    acl.append(Ace::user(AceType::Allow, 0x8000_0001, ACE_READ_DATA));
    acl.append(Ace::everyone(AceType::Allow, ACE_READ_DATA));
    assert_eq!(acl.byte_size(), 2 * BASIC_ACE_SIZE);

    acl.upgrade(None).expect("valid entries");
    assert_eq!(acl.version(), LayoutVersion::Extended);
    assert_eq!(acl.aces()[0].who, u64::from(UID_NOBODY));
    assert_eq!(acl.byte_size(), EXTENDED_ACE_SIZE + EXTENDED_ACE_HEADER_SIZE);

    let before = acl.clone();
    acl.upgrade(None).expect("no-op");
    assert_eq!(acl, before);
}

#[test]
fn view_converts_back_to_an_entry() {
    let acl = sample();
    for (view, ace) in acl.iter_unmasked().zip(acl.aces()) {
        assert_eq!(&view.to_ace(), ace);
    }
}

fn arb_ace() -> impl Strategy<Value = Ace> {
    let class = prop_oneof![
        Just(0u16),
        Just(ACE_IDENTIFIER_GROUP),
        Just(protocol::acl::ACE_OWNER),
        Just(protocol::acl::OWNING_GROUP),
        Just(protocol::acl::ACE_EVERYONE),
    ];
    let inherit = prop_oneof![
        Just(0u16),
        Just(ACE_FILE_INHERIT_ACE),
        Just(ACE_DIRECTORY_INHERIT_ACE | ACE_INHERIT_ONLY_ACE),
    ];
    (
        prop_oneof![Just(AceType::Allow), Just(AceType::Deny)],
        class,
        inherit,
        0u32..0x20_0000,
        prop_oneof![Just(1000u64), 0u64..5000],
    )
        .prop_map(|(ace_type, class, inherit, mask, who)| {
            Ace::new(ace_type, class | inherit, mask, who)
        })
}

proptest! {
    #[test]
    fn compute_masks_is_idempotent(
        aces in proptest::collection::vec(arb_ace(), 0..24),
        is_dir in any::<bool>(),
        mask_x in any::<bool>(),
    ) {
        let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
        for ace in aces {
            acl.append(ace);
        }
        let hint = if mask_x { ObjectFlags::ACL_MASK_X } else { ObjectFlags::ACL_CHMOD };
        acl.set_hints(ObjectFlags::from_bits(hint));

        acl.compute_masks(is_dir);
        let first = (acl.owner_mask(), acl.group_mask());
        acl.compute_masks(is_dir);
        prop_assert_eq!(first, (acl.owner_mask(), acl.group_mask()));
    }

    #[test]
    fn masked_view_never_grants_more(
        aces in proptest::collection::vec(arb_ace(), 0..24),
    ) {
        let mut acl = Acl::new(LayoutVersion::Extended, OWNER);
        for ace in aces {
            acl.append(ace);
        }
        acl.set_hints(ObjectFlags::from_bits(ObjectFlags::ACL_CHMOD));
        acl.compute_masks(false);
        for (masked, raw) in acl.iter().zip(acl.iter_unmasked()) {
            prop_assert_eq!(masked.mask.as_raw() & !raw.mask.as_raw(), 0);
            prop_assert_eq!(masked.flags, raw.flags);
            prop_assert_eq!(masked.who, raw.who);
        }
    }
}
