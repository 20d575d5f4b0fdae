use metadata::{AclOptions, AclQuery, CreateRequest, ObjectType, Unprivileged};
use proptest::prelude::*;
use test_support::{StaticIdentityMap, cred, memory_manager};

fn kind(is_dir: bool) -> ObjectType {
    if is_dir {
        ObjectType::Directory
    } else {
        ObjectType::File
    }
}

proptest! {
    #[test]
    fn trivial_acls_grant_what_the_mode_grants(mode in 0u32..=0o777, is_dir in any::<bool>()) {
        let (_, manager) = memory_manager(StaticIdentityMap::new(), Unprivileged, AclOptions::new());
        let owner = cred(1000, 100);
        let member = cred(3000, 100);
        let stranger = cred(2000, 200);
        let object = manager.create_root(kind(is_dir), mode, &owner).expect("create");

        for (who, shift) in [(&owner, 6), (&member, 3), (&stranger, 0)] {
            for bit in [0o4, 0o2, 0o1] {
                let granted = manager.access_rwx(object, bit << 6, false, who).is_ok();
                prop_assert_eq!(granted, mode & (bit << shift) != 0);
            }
        }
    }

    #[test]
    fn chmod_leaves_a_trivial_acl_that_matches(
        initial in 0u32..=0o777,
        updated in 0u32..=0o777,
    ) {
        let (_, manager) = memory_manager(StaticIdentityMap::new(), Unprivileged, AclOptions::new());
        let owner = cred(1000, 100);
        let root = manager.create_root(ObjectType::Directory, 0o777, &owner).expect("root");
        let file = manager
            .create(root, CreateRequest::new(ObjectType::File, initial), &owner)
            .expect("create");

        let mode = manager.chmod(file, updated, &owner).expect("chmod");
        prop_assert_eq!(mode & 0o777, updated);

        let loaded = manager.read_acl(file).expect("load");
        prop_assert!(metadata::is_trivial(&loaded.acl));
        prop_assert_eq!(loaded.attrs.mode & 0o777, updated);

        let listed = manager.get_acl(file, AclQuery::default(), &owner).expect("list");
        prop_assert_eq!(listed.len(), loaded.acl.len());
    }
}
