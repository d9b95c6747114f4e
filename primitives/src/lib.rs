//! Types and traits shared by the confidential asset pallets.
#![cfg_attr(not(feature = "std"), no_std)]

use frame_support::pallet_prelude::*;

/// Opaque handle referencing an encrypted 64-bit unsigned scalar held by the
/// FHE coprocessor. A homomorphic operation always yields a *new* handle; the
/// ciphertext behind an existing handle is never rewritten.
pub type Handle = [u8; 32];

/// Sentinel for a slot that has never held a ciphertext. Engines treat it as
/// an encryption of zero and never issue it for a live ciphertext.
pub const ZERO_HANDLE: Handle = [0u8; 32];

/// Proof blob binding an input ciphertext to (contract context, submitter).
pub type MaxProofLen = ConstU32<8192>;
pub type InputProof = BoundedVec<u8, MaxProofLen>;

/// Operations exposed by the FHE coprocessor, injected by the runtime.
///
/// Replay protection for input proofs is the coprocessor's concern, not the
/// caller's: a proof that verifies may verify again.
pub trait FheEngine<AccountId> {
    /// Check that `handle` was produced for `context` by `submitter`.
    fn verify_input(
        handle: Handle,
        context: &AccountId,
        submitter: &AccountId,
        proof: &InputProof,
    ) -> bool;

    fn add(a: Handle, b: Handle) -> Handle;
    fn sub(x: Handle, d: Handle) -> Handle;

    /// Checked subtraction: `(ok, difference)` where `ok` is an encrypted
    /// boolean that is true iff no borrow occurred.
    fn try_sub(x: Handle, d: Handle) -> (Handle, Handle);

    /// Encrypted ternary: `cond ? x : y`.
    fn select(cond: Handle, x: Handle, y: Handle) -> Handle;

    /// Trivial encryption of a public constant.
    fn encrypt_constant(value: u64) -> Handle;
}

/// Decryption permissions per ciphertext handle. Append-only: handles are
/// superseded rather than mutated, so grants are never retracted.
pub trait DecryptionAcl<AccountId> {
    fn allow(handle: Handle, who: &AccountId);
    fn is_allowed(handle: Handle, who: &AccountId) -> bool;
}

impl<AccountId> DecryptionAcl<AccountId> for () {
    fn allow(_handle: Handle, _who: &AccountId) {}
    fn is_allowed(_handle: Handle, _who: &AccountId) -> bool {
        false
    }
}

pub trait OperatorRegistry<AccountId, AssetId, Moment> {
    /// True if `operator` may move (`holder`, `asset`) funds at `now`.
    fn is_operator(
        holder: &AccountId,
        asset: &AssetId,
        operator: &AccountId,
        now: Moment,
    ) -> bool;
}

impl<AccountId, AssetId, Moment> OperatorRegistry<AccountId, AssetId, Moment> for () {
    fn is_operator(
        _holder: &AccountId,
        _asset: &AssetId,
        _operator: &AccountId,
        _now: Moment,
    ) -> bool {
        false
    }
}

/// Ledger surface other pallets build on. Implemented by the confidential
/// assets pallet; consumed by the staking pallet.
pub trait ConfidentialLedger<AccountId, AssetId> {
    /// Current balance handle, [`ZERO_HANDLE`] for an untouched slot.
    fn balance_of(asset: AssetId, who: &AccountId) -> Handle;

    /// Proof-verified, operator-gated transfer of `owner`'s funds by `caller`.
    /// Returns the handle of the amount actually moved.
    fn transfer_from(
        asset: AssetId,
        caller: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: Handle,
        proof: &InputProof,
    ) -> Result<Handle, DispatchError>;

    /// Transfer without an input proof. `from` must be an account the calling
    /// pallet itself controls; the runtime wiring is the trust boundary here.
    fn transfer(
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Handle,
    ) -> Result<Handle, DispatchError>;
}
