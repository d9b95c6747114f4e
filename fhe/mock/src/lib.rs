//! Plaintext stand-in for the FHE coprocessor, used by pallet tests.
//!
//! Values live as `u64` plaintexts behind counter-derived handles in a
//! thread-local arena, so every test externality sees its own coprocessor.
//! Arithmetic wraps, like the real backend: callers are expected to guard
//! subtraction with [`FheEngine::try_sub`] + [`FheEngine::select`] rather
//! than rely on any clamping.
//!
//! Input proofs are the SCALE encoding of `(context, submitter, handle)`;
//! [`FheEngine::verify_input`] simply re-derives and compares. That gives the
//! same binding the real verifier enforces, with none of the cryptography.

use std::{cell::RefCell, collections::BTreeMap};

use confidential_primitives::{FheEngine, Handle, InputProof, ZERO_HANDLE};
use parity_scale_codec::Encode;

#[derive(Default)]
struct Arena {
    values: BTreeMap<Handle, u64>,
    flags: BTreeMap<Handle, bool>,
    next: u64,
}

thread_local! {
    static ARENA: RefCell<Arena> = RefCell::new(Arena::default());
}

fn fresh_handle(arena: &mut Arena) -> Handle {
    arena.next += 1;
    let mut handle = ZERO_HANDLE;
    handle[..8].copy_from_slice(&arena.next.to_be_bytes());
    handle
}

fn value_of(arena: &Arena, handle: Handle) -> u64 {
    if handle == ZERO_HANDLE {
        return 0;
    }
    arena
        .values
        .get(&handle)
        .copied()
        .expect("handle not present in mock arena")
}

fn insert_value(arena: &mut Arena, value: u64) -> Handle {
    let handle = fresh_handle(arena);
    arena.values.insert(handle, value);
    handle
}

fn binding<AccountId: Encode>(context: &AccountId, submitter: &AccountId, handle: Handle) -> Vec<u8> {
    (context, submitter, handle).encode()
}

/// The engine itself. Wire as `type Fhe = MockFhe` in a mock runtime.
pub struct MockFhe;

impl<AccountId: Encode> FheEngine<AccountId> for MockFhe {
    fn verify_input(
        handle: Handle,
        context: &AccountId,
        submitter: &AccountId,
        proof: &InputProof,
    ) -> bool {
        ARENA.with(|a| a.borrow().values.contains_key(&handle))
            && proof.as_slice() == binding(context, submitter, handle).as_slice()
    }

    fn add(a: Handle, b: Handle) -> Handle {
        ARENA.with(|arena| {
            let arena = &mut *arena.borrow_mut();
            let sum = value_of(arena, a).wrapping_add(value_of(arena, b));
            insert_value(arena, sum)
        })
    }

    fn sub(x: Handle, d: Handle) -> Handle {
        ARENA.with(|arena| {
            let arena = &mut *arena.borrow_mut();
            let diff = value_of(arena, x).wrapping_sub(value_of(arena, d));
            insert_value(arena, diff)
        })
    }

    fn try_sub(x: Handle, d: Handle) -> (Handle, Handle) {
        ARENA.with(|arena| {
            let arena = &mut *arena.borrow_mut();
            let (xv, dv) = (value_of(arena, x), value_of(arena, d));
            let flag = fresh_handle(arena);
            arena.flags.insert(flag, xv >= dv);
            let diff = insert_value(arena, xv.wrapping_sub(dv));
            (flag, diff)
        })
    }

    fn select(cond: Handle, x: Handle, y: Handle) -> Handle {
        ARENA.with(|arena| {
            let arena = &mut *arena.borrow_mut();
            let taken = *arena
                .flags
                .get(&cond)
                .expect("condition handle not present in mock arena");
            let picked = value_of(arena, if taken { x } else { y });
            insert_value(arena, picked)
        })
    }

    fn encrypt_constant(value: u64) -> Handle {
        ARENA.with(|arena| insert_value(&mut arena.borrow_mut(), value))
    }
}

/// Client-side encryption of `value` for submission to `context` by
/// `submitter`; returns the handle plus a proof that binds all three.
pub fn encrypt_for<AccountId: Encode>(
    value: u64,
    context: &AccountId,
    submitter: &AccountId,
) -> (Handle, InputProof) {
    let handle = ARENA.with(|arena| insert_value(&mut arena.borrow_mut(), value));
    let proof = InputProof::truncate_from(binding(context, submitter, handle));
    (handle, proof)
}

/// Plaintext behind `handle`. Tests pair this with the ACL pallet's
/// `can_decrypt` when asserting who may learn a value; the arena itself does
/// not gate reads.
pub fn decrypt(handle: Handle) -> u64 {
    ARENA.with(|arena| value_of(&arena.borrow(), handle))
}

/// Drop all handles. Call at the start of a test when handle reuse across
/// externalities would be confusing.
pub fn reset() {
    ARENA.with(|arena| *arena.borrow_mut() = Arena::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_and_binding_round_trip() {
        reset();
        let (handle, proof) = encrypt_for(700u64, &1u64, &2u64);
        assert!(<MockFhe as FheEngine<u64>>::verify_input(
            handle, &1u64, &2u64, &proof
        ));
        assert!(!<MockFhe as FheEngine<u64>>::verify_input(
            handle, &1u64, &3u64, &proof
        ));

        let c = <MockFhe as FheEngine<u64>>::encrypt_constant(42);
        let sum = <MockFhe as FheEngine<u64>>::add(handle, c);
        assert_eq!(decrypt(sum), 742);

        let (ok, _) = <MockFhe as FheEngine<u64>>::try_sub(sum, c);
        let moved = <MockFhe as FheEngine<u64>>::select(ok, c, ZERO_HANDLE);
        assert_eq!(decrypt(moved), 42);

        let (short, _) = <MockFhe as FheEngine<u64>>::try_sub(c, sum);
        let none = <MockFhe as FheEngine<u64>>::select(short, c, ZERO_HANDLE);
        assert_eq!(decrypt(none), 0);
    }

    #[test]
    fn zero_sentinel_reads_as_zero() {
        reset();
        assert_eq!(decrypt(ZERO_HANDLE), 0);
        let c = <MockFhe as FheEngine<u64>>::encrypt_constant(9);
        let sum = <MockFhe as FheEngine<u64>>::add(ZERO_HANDLE, c);
        assert_eq!(decrypt(sum), 9);
    }
}
