use std::sync::Arc;

use super::*;
use crate::mode::{S_IFDIR, S_IFREG, S_ISVTX};
use crate::ownership::DomainIdentityMapper;
use crate::permission::Superuser;
use crate::store::{MemoryStore, StoredAcl};
use protocol::acl::{
    ACE_ALL_PERMS, ACE_DIRECTORY_INHERIT_ACE, ACE_EXECUTE, ACE_FILE_INHERIT_ACE,
    ACE_INHERIT_ONLY_ACE, ACE_INHERITED_ACE, ACE_READ_DATA, ACE_WRITE_DATA, AceType,
};

const OWNER: u32 = 1000;
const GROUP: u32 = 100;

fn owner() -> Credential {
    Credential::new(OWNER, GROUP)
}

fn stranger(uid: u32) -> Credential {
    Credential::new(uid, uid)
}

fn manager() -> AclManager<MemoryStore> {
    manager_with(AclOptions::new())
}

fn manager_with(options: AclOptions) -> AclManager<MemoryStore> {
    AclManager::new(MemoryStore::new(), LocalIdentityMapper, Unprivileged, options)
}

fn shared<P: PrivilegePolicy>(
    store: &Arc<MemoryStore>,
    policy: P,
    options: AclOptions,
) -> AclManager<Arc<MemoryStore>, LocalIdentityMapper, P> {
    AclManager::new(Arc::clone(store), LocalIdentityMapper, policy, options)
}

fn inheritable_dir(manager: &AclManager<MemoryStore>) -> ObjectId {
    let dir = manager
        .create_root(ObjectType::Directory, 0o755, &owner())
        .expect("root");
    let both = ACE_FILE_INHERIT_ACE | ACE_DIRECTORY_INHERIT_ACE;
    manager
        .set_acl(
            dir,
            AclUpdate::new(vec![
                Ace::owner(AceType::Allow, ACE_ALL_PERMS).with_flags(both),
                Ace::user(AceType::Allow, 2000, ACE_READ_DATA | ACE_WRITE_DATA)
                    .with_flags(ACE_FILE_INHERIT_ACE),
                Ace::everyone(AceType::Allow, ACE_READ_DATA | ACE_EXECUTE).with_flags(both),
            ]),
            &owner(),
        )
        .expect("set acl");
    dir
}

#[test]
fn root_directory_gets_a_trivial_acl() {
    let manager = manager();
    let dir = manager
        .create_root(ObjectType::Directory, 0o755, &owner())
        .expect("root");

    let loaded = manager.read_acl(dir).expect("load");
    assert_eq!(loaded.attrs.mode, S_IFDIR | 0o755);
    assert_eq!(loaded.attrs.owner, Fuid::local(OWNER));
    assert_eq!(loaded.attrs.group, Fuid::local(GROUP));
    assert!(loaded.attrs.pflags.contains(ObjectFlags::ACL_TRIVIAL));

    let listing = manager
        .get_acl(dir, AclQuery::default(), &owner())
        .expect("listing");
    assert!(!listing.is_empty());
    assert!(listing.flags.contains(ObjectFlags::ACL_AUTO_INHERIT));
}

#[test]
fn access_follows_the_mode_of_a_new_file() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");

    assert!(manager.access(file, ACE_WRITE_DATA, false, &owner()).is_ok());
    assert!(manager.access(file, ACE_READ_DATA, false, &stranger(3000)).is_ok());
    assert!(matches!(
        manager.access(file, ACE_WRITE_DATA, false, &stranger(3000)),
        Err(MetadataError::AccessDenied)
    ));
    assert!(manager.access_rwx(file, 0o600, false, &owner()).is_ok());
    assert!(manager.has_access(file, &stranger(3000)).expect("probe"));
    assert!(manager.fast_execute_check(file, &owner()).is_err());
}

#[test]
fn missing_and_corrupt_objects_are_reported() {
    let manager = manager();
    assert!(matches!(
        manager.access(42, ACE_READ_DATA, false, &owner()),
        Err(MetadataError::NotFound(42))
    ));

    let id = manager.store().allocate_id();
    let attrs = ObjectAttrs::new(ObjectType::File, Fuid::local(OWNER), Fuid::local(GROUP), 0o644);
    let garbage = StoredAcl {
        version: LayoutVersion::Extended,
        bytes: vec![0xff; 5],
        count: 1,
    };
    manager.store().commit(id, &attrs, &garbage).expect("commit");
    assert!(matches!(
        manager.access(id, ACE_READ_DATA, false, &owner()),
        Err(MetadataError::Corrupt(_))
    ));
}

#[test]
fn set_acl_round_trips_through_get_acl() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o600, &owner())
        .expect("root");
    let entries = vec![
        Ace::owner(AceType::Allow, ACE_ALL_PERMS),
        Ace::user(AceType::Allow, 2000, ACE_READ_DATA),
        Ace::group(AceType::Deny, 300, ACE_WRITE_DATA),
    ];
    manager
        .set_acl(file, AclUpdate::new(entries.clone()), &owner())
        .expect("set acl");

    let listing = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    assert_eq!(listing.entries, entries);
    assert!(manager.access(file, ACE_READ_DATA, false, &stranger(2000)).is_ok());

    let loaded = manager.read_acl(file).expect("load");
    assert!(!loaded.attrs.pflags.contains(ObjectFlags::ACL_TRIVIAL));
    assert_eq!(loaded.attrs.mode & 0o777, 0o700);
}

#[test]
fn set_acl_rejects_unusable_entry_lists() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");

    assert!(matches!(
        manager.set_acl(file, AclUpdate::new(Vec::new()), &owner()),
        Err(MetadataError::EmptyAcl)
    ));

    let too_many = vec![Ace::everyone(AceType::Allow, ACE_READ_DATA); MAX_ACL_ENTRIES + 1];
    assert!(matches!(
        manager.set_acl(file, AclUpdate::new(too_many), &owner()),
        Err(MetadataError::TooManyEntries { count, max })
            if count == MAX_ACL_ENTRIES + 1 && max == MAX_ACL_ENTRIES
    ));

    let dangling = vec![Ace::everyone(AceType::Allow, ACE_READ_DATA).with_flags(ACE_INHERIT_ONLY_ACE)];
    assert!(matches!(
        manager.set_acl(file, AclUpdate::new(dangling), &owner()),
        Err(MetadataError::InvalidAcl(_))
    ));
}

#[test]
fn set_acl_needs_write_acl_and_a_mutable_object() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o666, &owner())
        .expect("root");
    let entries = vec![Ace::everyone(AceType::Allow, ACE_ALL_PERMS)];

    let refused = manager
        .set_acl(file, AclUpdate::new(entries.clone()), &stranger(3000))
        .expect_err("stranger");
    assert!(refused.is_access_refusal());

    let mut attrs = manager.store().attrs(file).expect("attrs");
    attrs.pflags.insert(ObjectFlags::IMMUTABLE);
    manager.store().set_attrs(file, &attrs).expect("set attrs");
    assert!(matches!(
        manager.set_acl(file, AclUpdate::new(entries), &owner()),
        Err(MetadataError::NotPermitted)
    ));
    assert!(matches!(
        manager.chmod(file, 0o600, &owner()),
        Err(MetadataError::NotPermitted)
    ));
}

#[test]
fn acl_flags_are_replaced_or_kept() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");
    let entries = vec![Ace::owner(AceType::Allow, ACE_ALL_PERMS)];

    manager
        .set_acl(
            file,
            AclUpdate::new(entries.clone())
                .with_flags(ObjectFlags::from_bits(ObjectFlags::ACL_PROTECTED)),
            &owner(),
        )
        .expect("protect");
    manager
        .set_acl(file, AclUpdate::new(entries), &owner())
        .expect("keep flags");

    let listing = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    assert!(listing.flags.contains(ObjectFlags::ACL_PROTECTED));
    assert!(!listing.flags.contains(ObjectFlags::ACL_DEFAULTED));
}

#[test]
fn object_scoped_entries_are_listed_on_request() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");
    manager
        .set_acl(
            file,
            AclUpdate::new(vec![
                Ace::owner(AceType::Allow, ACE_ALL_PERMS),
                Ace::new(AceType::AllowedObject, 0, ACE_READ_DATA, 2000),
            ]),
            &owner(),
        )
        .expect("set acl");

    let loaded = manager.read_acl(file).expect("load");
    assert!(loaded.attrs.pflags.contains(ObjectFlags::ACL_OBJ_ACE));

    let visible = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    assert_eq!(visible.len(), 1);
    let all = AclQuery {
        all_types: true,
        skip_check: true,
    };
    assert_eq!(manager.get_acl(file, all, &owner()).expect("listing").len(), 2);
}

#[test]
fn composite_identities_are_stored_and_listed_locally() {
    let mapper = DomainIdentityMapper::new();
    let ephemeral = 0x8000_0010;
    let domain = Fuid::new(3, 1234);
    mapper.register(ephemeral, IdType::User, domain);
    let manager = AclManager::new(MemoryStore::new(), mapper, Unprivileged, AclOptions::new());

    let file = manager
        .create_root(ObjectType::File, 0o600, &owner())
        .expect("root");
    manager
        .set_acl(
            file,
            AclUpdate::new(vec![
                Ace::owner(AceType::Allow, ACE_ALL_PERMS),
                Ace::user(AceType::Allow, u64::from(ephemeral), ACE_READ_DATA),
            ]),
            &owner(),
        )
        .expect("set acl");

    let loaded = manager.read_acl(file).expect("load");
    assert_eq!(loaded.acl.aces()[1].who, domain.as_raw());

    let listing = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    assert_eq!(listing.entries[1].who, u64::from(ephemeral));

    let user = Credential::new(ephemeral, ephemeral);
    assert!(manager.access(file, ACE_READ_DATA, false, &user).is_ok());
}

#[test]
fn chmod_rewrites_the_acl_and_mode() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");

    let mode = manager.chmod(file, 0o600, &owner()).expect("chmod");
    assert_eq!(mode, S_IFREG | 0o600);
    assert_eq!(manager.read_acl(file).expect("load").attrs.mode, mode);
    assert!(manager.access(file, ACE_READ_DATA, false, &stranger(3000)).is_err());

    assert!(
        manager
            .chmod(file, 0o777, &stranger(3000))
            .expect_err("stranger")
            .is_access_refusal()
    );
}

#[test]
fn chmod_drops_setgid_outside_the_owning_group() {
    let store = Arc::new(MemoryStore::new());
    let admin = shared(&store, Superuser, AclOptions::new());
    let user = shared(&store, Unprivileged, AclOptions::new());

    let file = admin
        .create_root(ObjectType::File, 0o644, &Credential::new(OWNER, 200))
        .expect("root");
    let mode = user.chmod(file, 0o2755, &owner()).expect("chmod");
    assert_eq!(mode & 0o7777, 0o755);

    let mode = admin.chmod(file, 0o2755, &owner()).expect("chmod");
    assert_eq!(mode & 0o7777, 0o2755);
}

#[test]
fn chmod_upgrades_basic_layout_acls() {
    let store = Arc::new(MemoryStore::new());
    let legacy = shared(&store, Unprivileged, AclOptions::new().use_fuids(false));
    let current = shared(
        &store,
        Unprivileged,
        AclOptions::new().acl_mode(crate::options::AclMode::Mask),
    );

    let file = legacy
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");
    assert_eq!(store.read_acl(file).expect("acl").version, LayoutVersion::Basic);

    current.chmod(file, 0o640, &owner()).expect("chmod");
    assert_eq!(store.read_acl(file).expect("acl").version, LayoutVersion::Extended);
}

#[test]
fn chown_moves_ownership_and_keeps_entries() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o640, &owner())
        .expect("root");
    let before = manager.read_acl(file).expect("load").acl.aces().to_vec();

    manager
        .chown(file, None, Some(GROUP + 1), &owner())
        .expect("chown group");
    let loaded = manager.read_acl(file).expect("load");
    assert_eq!(loaded.attrs.group, Fuid::local(GROUP + 1));
    assert_eq!(loaded.attrs.owner, Fuid::local(OWNER));
    assert_eq!(loaded.acl.aces(), before.as_slice());

    assert!(
        manager
            .chown(file, Some(3000), None, &stranger(3000))
            .expect_err("stranger")
            .is_access_refusal()
    );
    assert!(manager.chown(file, None, None, &stranger(3000)).is_ok());
}

#[test]
fn new_files_inherit_from_their_directory() {
    let manager = manager();
    let dir = inheritable_dir(&manager);
    assert!(
        manager
            .read_acl(dir)
            .expect("load")
            .attrs
            .pflags
            .contains(ObjectFlags::INHERIT_ACE)
    );

    let file = manager
        .create(dir, CreateRequest::new(ObjectType::File, 0o644), &owner())
        .expect("create");
    let listing = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    let named = listing
        .entries
        .iter()
        .find(|ace| !ace.is_special())
        .expect("named entry");
    assert_eq!(named.who, 2000);
    assert!(named.flags.contains(ACE_INHERITED_ACE));
    assert!(!named.mask.contains(ACE_WRITE_DATA));

    assert!(manager.access(file, ACE_READ_DATA, false, &stranger(2000)).is_ok());
    assert!(manager.access(file, ACE_WRITE_DATA, false, &stranger(2000)).is_err());
    let loaded = manager.read_acl(file).expect("load");
    assert_eq!(loaded.attrs.mode, S_IFREG | 0o644);
    assert!(!loaded.attrs.pflags.contains(ObjectFlags::ACL_TRIVIAL));
}

#[test]
fn explicit_acl_replaces_inheritance() {
    let manager = manager();
    let dir = inheritable_dir(&manager);
    let request = CreateRequest::new(ObjectType::File, 0o644)
        .with_acl(vec![Ace::owner(AceType::Allow, ACE_ALL_PERMS)]);
    let file = manager.create(dir, request, &owner()).expect("create");

    let listing = manager
        .get_acl(file, AclQuery::default(), &owner())
        .expect("listing");
    assert_eq!(listing.entries, vec![Ace::owner(AceType::Allow, ACE_ALL_PERMS)]);
    assert!(manager.access(file, ACE_READ_DATA, false, &stranger(2000)).is_err());
}

#[test]
fn create_needs_add_permission_on_a_directory() {
    let manager = manager();
    let dir = manager
        .create_root(ObjectType::Directory, 0o755, &owner())
        .expect("root");
    let file = manager
        .create(dir, CreateRequest::new(ObjectType::File, 0o644), &owner())
        .expect("create");

    assert!(matches!(
        manager.create(dir, CreateRequest::new(ObjectType::File, 0o644), &stranger(3000)),
        Err(MetadataError::AccessDenied)
    ));
    assert!(matches!(
        manager.create(file, CreateRequest::new(ObjectType::File, 0o644), &owner()),
        Err(MetadataError::Unsupported(_))
    ));
}

#[test]
fn setgid_directories_hand_down_their_group() {
    let manager = manager();
    let dir = manager
        .create_root(ObjectType::Directory, 0o2777, &owner())
        .expect("root");
    let member = Credential::new(2000, 300).with_groups([GROUP]);

    let sub = manager
        .create(dir, CreateRequest::new(ObjectType::Directory, 0o755), &member)
        .expect("subdir");
    let attrs = manager.read_acl(sub).expect("load").attrs;
    assert_eq!(attrs.group, Fuid::local(GROUP));
    assert_ne!(attrs.mode & S_ISGID, 0);
    assert_eq!(attrs.owner, Fuid::local(2000));

    let request = CreateRequest::new(ObjectType::File, 0o644).with_gid(500);
    let file = manager.create(dir, request, &member).expect("file");
    assert_eq!(manager.read_acl(file).expect("load").attrs.group, Fuid::local(GROUP));
}

#[test]
fn requested_group_is_checked_against_the_caller() {
    let manager = manager();
    let dir = manager
        .create_root(ObjectType::Directory, 0o777, &owner())
        .expect("root");
    let outsider = Credential::new(2000, 300);

    let request = CreateRequest::new(ObjectType::File, 0o2644).with_gid(GROUP);
    let file = manager.create(dir, request, &outsider).expect("file");
    let attrs = manager.read_acl(file).expect("load").attrs;
    assert_eq!(attrs.group, Fuid::local(GROUP));
    assert_eq!(attrs.mode & S_ISGID, 0);

    let request = CreateRequest::new(ObjectType::File, 0o644).with_gid(500);
    let file = manager.create(dir, request, &outsider).expect("file");
    assert_eq!(manager.read_acl(file).expect("load").attrs.group, Fuid::local(300));
}

#[test]
fn delete_and_rename_consult_the_directory() {
    let manager = manager();
    let private = manager
        .create_root(ObjectType::Directory, 0o755, &owner())
        .expect("root");
    let open = manager
        .create_root(ObjectType::Directory, 0o777, &owner())
        .expect("root");
    let file = manager
        .create(private, CreateRequest::new(ObjectType::File, 0o644), &owner())
        .expect("create");

    assert!(manager.delete_access(private, file, &owner()).is_ok());
    assert!(matches!(
        manager.delete_access(private, file, &stranger(3000)),
        Err(MetadataError::AccessDenied)
    ));
    assert!(manager.delete_access(open, file, &stranger(3000)).is_ok());

    assert!(manager.rename_access(private, file, open, None, &owner()).is_ok());
    assert!(
        manager
            .rename_access(open, file, private, None, &stranger(3000))
            .is_err()
    );
}

#[test]
fn sticky_directories_protect_other_users_files() {
    let manager = manager();
    let dir = manager
        .create_root(ObjectType::Directory, 0o777 | S_ISVTX, &owner())
        .expect("root");
    let file = manager
        .create(dir, CreateRequest::new(ObjectType::File, 0o644), &stranger(3000))
        .expect("create");

    assert!(manager.delete_access(dir, file, &stranger(3000)).is_ok());
    assert!(manager.delete_access(dir, file, &owner()).is_ok());
    assert!(matches!(
        manager.delete_access(dir, file, &stranger(2000)),
        Err(MetadataError::AccessDenied)
    ));
}

#[test]
fn attribute_directories_are_checked_against_their_object() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o644, &owner())
        .expect("root");
    let xattr = manager
        .create_root(ObjectType::Directory, 0o777, &owner())
        .expect("xattr dir");
    let mut attrs = manager.store().attrs(xattr).expect("attrs");
    attrs.pflags.insert(ObjectFlags::XATTR);
    attrs.xattr_parent = Some(file);
    manager.store().set_attrs(xattr, &attrs).expect("set attrs");

    assert!(manager.access(xattr, ACE_READ_DATA, false, &stranger(3000)).is_ok());
    assert!(matches!(
        manager.access(xattr, ACE_WRITE_DATA, false, &stranger(3000)),
        Err(MetadataError::AccessDenied)
    ));
    assert!(manager.access(xattr, ACE_WRITE_DATA, false, &owner()).is_ok());
}

#[test]
fn unchecked_listing_still_consults_the_object_attributes() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o600, &owner())
        .expect("root");
    manager
        .set_acl(
            file,
            AclUpdate::new(vec![Ace::owner(AceType::Allow, ACE_ALL_PERMS)]),
            &owner(),
        )
        .expect("set acl");
    let mut quarantined = manager.store().attrs(file).expect("attrs");
    quarantined.pflags.insert(ObjectFlags::AV_QUARANTINED);
    manager.store().set_attrs(file, &quarantined).expect("set attrs");

    let unchecked = AclQuery {
        all_types: false,
        skip_check: true,
    };
    assert!(matches!(
        manager.get_acl(file, AclQuery::default(), &stranger(3000)),
        Err(MetadataError::AccessDenied)
    ));
    assert_eq!(
        manager
            .get_acl(file, unchecked, &stranger(3000))
            .expect("listing")
            .len(),
        1
    );

    let xattr = manager
        .create_root(ObjectType::Directory, 0o777, &owner())
        .expect("xattr dir");
    let mut attrs = manager.store().attrs(xattr).expect("attrs");
    attrs.pflags.insert(ObjectFlags::XATTR);
    attrs.xattr_parent = Some(file);
    manager.store().set_attrs(xattr, &attrs).expect("set attrs");
    assert!(manager.get_acl(xattr, unchecked, &stranger(3000)).is_ok());

    manager.remove(file).expect("remove base");
    assert!(matches!(
        manager.get_acl(xattr, unchecked, &stranger(3000)),
        Err(MetadataError::NotFound(id)) if id == file
    ));
}

#[test]
fn removed_objects_release_their_locks() {
    let manager = manager();
    let file = manager
        .create_root(ObjectType::File, 0o600, &owner())
        .expect("root");
    let kept = manager
        .create_root(ObjectType::File, 0o600, &owner())
        .expect("root");
    assert!(manager.access(file, ACE_READ_DATA, false, &owner()).is_ok());
    assert!(manager.access(kept, ACE_READ_DATA, false, &owner()).is_ok());
    assert_eq!(manager.locks().len(), 2);

    manager.remove(file).expect("remove");
    assert_eq!(manager.locks().len(), 1);
    assert_eq!(manager.store().len(), 1);
    assert!(matches!(
        manager.read_acl(file),
        Err(MetadataError::NotFound(id)) if id == file
    ));
    assert!(manager.read_acl(kept).is_ok());

    assert!(matches!(
        manager.remove(file),
        Err(MetadataError::NotFound(_))
    ));
    assert_eq!(manager.locks().len(), 1);
}
