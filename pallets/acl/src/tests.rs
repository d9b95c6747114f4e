#![cfg(test)]

use confidential_primitives::DecryptionAcl;
use frame_support::{assert_noop, assert_ok, construct_runtime, derive_impl};
use sp_io::TestExternalities;
use sp_runtime::BuildStorage;

use crate as pallet_decryption_acl;
use crate::{Error, Permissions};

pub type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
    pub enum Test {
        System: frame_system,
        Acl: pallet_decryption_acl,
    }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
    type Block = Block;
}

impl crate::Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type WeightInfo = ();
}

pub fn new_test_ext() -> TestExternalities {
    let storage = frame_system::GenesisConfig::<Test>::default()
        .build_storage()
        .expect("valid default genesis storage");
    TestExternalities::from(storage)
}

const ALICE: u64 = 1;
const BOB: u64 = 2;
const CAROL: u64 = 3;

fn handle(n: u8) -> confidential_primitives::Handle {
    [n; 32]
}

#[test]
fn grant_is_recorded_and_queryable() {
    new_test_ext().execute_with(|| {
        let h = handle(7);
        assert!(!Acl::can_decrypt(h, &ALICE));

        <Acl as DecryptionAcl<u64>>::allow(h, &ALICE);
        assert!(Acl::can_decrypt(h, &ALICE));
        assert!(<Acl as DecryptionAcl<u64>>::is_allowed(h, &ALICE));
        // Grants are per handle, per principal.
        assert!(!Acl::can_decrypt(h, &BOB));
        assert!(!Acl::can_decrypt(handle(8), &ALICE));
    });
}

#[test]
fn grant_is_idempotent() {
    new_test_ext().execute_with(|| {
        let h = handle(1);
        <Acl as DecryptionAcl<u64>>::allow(h, &ALICE);
        <Acl as DecryptionAcl<u64>>::allow(h, &ALICE);
        assert_eq!(Permissions::<Test>::iter_prefix(h).count(), 1);
    });
}

#[test]
fn permitted_principal_can_share_access() {
    new_test_ext().execute_with(|| {
        let h = handle(9);
        <Acl as DecryptionAcl<u64>>::allow(h, &ALICE);

        assert_ok!(Acl::allow(RuntimeOrigin::signed(ALICE), h, BOB));
        assert!(Acl::can_decrypt(h, &BOB));

        // The new principal can share onward as well.
        assert_ok!(Acl::allow(RuntimeOrigin::signed(BOB), h, CAROL));
        assert!(Acl::can_decrypt(h, &CAROL));
    });
}

#[test]
fn stranger_cannot_share_access() {
    new_test_ext().execute_with(|| {
        let h = handle(9);
        <Acl as DecryptionAcl<u64>>::allow(h, &ALICE);

        assert_noop!(
            Acl::allow(RuntimeOrigin::signed(BOB), h, CAROL),
            Error::<Test>::AccessDenied
        );
        assert!(!Acl::can_decrypt(h, &CAROL));
    });
}
