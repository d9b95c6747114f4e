//! Confidential assets pallet
//!
//! An encrypted-balance ledger: every balance is an opaque ciphertext handle
//! held by the FHE coprocessor, and every mutation replaces the slot's handle
//! with a freshly computed one. No plaintext amount is ever stored, emitted,
//! or compared on-chain.
//!
//! The coprocessor is injected through [`FheEngine`]; decryption permissions
//! are recorded through [`DecryptionAcl`] for every handle this pallet mints,
//! so balance owners (and the pallet itself) can later ask the off-chain
//! service for plaintext. Delegated transfers are gated by an
//! [`OperatorRegistry`].
//!
//! Overdrafts are resolved under encryption: a transfer moves
//! `balance covers amount ? amount : 0`, so the ledger conserves value even
//! though it can never inspect either operand.
#![cfg_attr(not(feature = "std"), no_std)]

use confidential_primitives::{
    ConfidentialLedger, DecryptionAcl, FheEngine, Handle, InputProof, OperatorRegistry,
    ZERO_HANDLE,
};
use frame_support::{pallet_prelude::*, PalletId};
use frame_system::pallet_prelude::*;
use scale_info::TypeInfo;
use sp_runtime::traits::AccountIdConversion;

pub use pallet::*;


#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + Ord + MaxEncodedLen + TypeInfo;

        /// Operations exposed by the FHE coprocessor injected by the runtime.
        type Fhe: FheEngine<Self::AccountId>;

        /// Where decryption grants for newly minted handles are recorded.
        type Acl: DecryptionAcl<Self::AccountId>;

        /// Operator layer. Defaults to rejecting every delegate when `()`.
        type Operators: OperatorRegistry<Self::AccountId, Self::AssetId, BlockNumberFor<Self>>;

        /// Amount minted per `claim`. Public by necessity: a faucet constant
        /// everyone knows is not a balance leak.
        #[pallet::constant]
        type FaucetAmount: Get<u64>;

        /// Sovereign account under which input proofs for this ledger are
        /// verified.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn claim() -> Weight;
        fn confidential_transfer() -> Weight;
        fn confidential_transfer_from() -> Weight;
    }
    impl WeightData for () {
        fn claim() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn confidential_transfer() -> Weight {
            Weight::from_parts(20_000, 0)
        }
        fn confidential_transfer_from() -> Weight {
            Weight::from_parts(22_000, 0)
        }
    }

    /// Encrypted balances: (asset, holder) -> current handle. Exactly one
    /// live handle per slot; superseded handles stay decryptable for anyone
    /// already granted but are never written again.
    #[pallet::storage]
    pub type Balances<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        Handle,
        OptionQuery,
    >;

    /// Encrypted total supply per asset, grown by faucet claims.
    #[pallet::storage]
    pub type TotalSupply<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AssetId, Handle, OptionQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        Claimed {
            asset: T::AssetId,
            who: T::AccountId,
            minted: Handle,
        },
        ConfidentialTransfer {
            asset: T::AssetId,
            from: T::AccountId,
            to: T::AccountId,
            transferred: Handle,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Input proof does not match (ciphertext, ledger, submitter).
        ProofInvalid,
        /// Caller is neither the holder nor an unexpired operator.
        NotAuthorized,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ---------- Read helpers ----------
    impl<T: Config> Pallet<T> {
        /// Current balance handle; the zero sentinel for untouched slots.
        pub fn confidential_balance_of(asset: T::AssetId, who: &T::AccountId) -> Handle {
            Balances::<T>::get(asset, who).unwrap_or(ZERO_HANDLE)
        }

        pub fn confidential_total_supply(asset: T::AssetId) -> Handle {
            TotalSupply::<T>::get(asset).unwrap_or(ZERO_HANDLE)
        }

        /// The ledger's sovereign account: proof context and ACL principal.
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Mint the faucet amount into the caller's balance. Deliberately
        /// unthrottled: every call adds another faucet round.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::claim())]
        pub fn claim(origin: OriginFor<T>, asset: T::AssetId) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let this = Self::account_id();

            let minted = T::Fhe::encrypt_constant(T::FaucetAmount::get());

            let balance = Self::confidential_balance_of(asset, &who);
            let new_balance = T::Fhe::add(balance, minted);
            T::Acl::allow(new_balance, &who);
            T::Acl::allow(new_balance, &this);
            Balances::<T>::insert(asset, &who, new_balance);

            let total = Self::confidential_total_supply(asset);
            let new_total = T::Fhe::add(total, minted);
            T::Acl::allow(new_total, &this);
            TotalSupply::<T>::insert(asset, new_total);

            T::Acl::allow(minted, &who);
            T::Acl::allow(minted, &this);

            Self::deposit_event(Event::Claimed { asset, who, minted });
            Ok(())
        }

        /// Move an encrypted amount from the caller to `to`.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::confidential_transfer())]
        pub fn confidential_transfer(
            origin: OriginFor<T>,
            asset: T::AssetId,
            to: T::AccountId,
            amount: Handle,
            proof: InputProof,
        ) -> DispatchResult {
            let from = ensure_signed(origin)?;
            ensure!(
                T::Fhe::verify_input(amount, &Self::account_id(), &from, &proof),
                Error::<T>::ProofInvalid
            );
            let transferred = Self::apply_transfer(asset, &from, &to, amount, None);
            Self::deposit_event(Event::ConfidentialTransfer {
                asset,
                from,
                to,
                transferred,
            });
            Ok(())
        }

        /// Move an encrypted amount out of `from` as `from` itself or as one
        /// of its unexpired operators.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::confidential_transfer_from())]
        pub fn confidential_transfer_from(
            origin: OriginFor<T>,
            asset: T::AssetId,
            from: T::AccountId,
            to: T::AccountId,
            amount: Handle,
            proof: InputProof,
        ) -> DispatchResult {
            let caller = ensure_signed(origin)?;
            Self::do_transfer_from(asset, &caller, &from, &to, amount, &proof)?;
            Ok(())
        }
    }

    impl<T: Config> Pallet<T> {
        #[inline]
        fn ensure_is_self_or_operator(
            holder: &T::AccountId,
            asset: &T::AssetId,
            caller: &T::AccountId,
        ) -> Result<(), Error<T>> {
            if caller == holder {
                return Ok(());
            }
            let now = <frame_system::Pallet<T>>::block_number();
            if T::Operators::is_operator(holder, asset, caller, now) {
                Ok(())
            } else {
                Err(Error::<T>::NotAuthorized)
            }
        }

        /// Shared proof-then-authorization path for delegated transfers.
        pub(crate) fn do_transfer_from(
            asset: T::AssetId,
            caller: &T::AccountId,
            from: &T::AccountId,
            to: &T::AccountId,
            amount: Handle,
            proof: &InputProof,
        ) -> Result<Handle, DispatchError> {
            ensure!(
                T::Fhe::verify_input(amount, &Self::account_id(), from, proof),
                Error::<T>::ProofInvalid
            );
            Self::ensure_is_self_or_operator(from, &asset, caller)?;

            let operator = (caller != from).then_some(caller);
            let transferred = Self::apply_transfer(asset, from, to, amount, operator);
            Self::deposit_event(Event::ConfidentialTransfer {
                asset,
                from: from.clone(),
                to: to.clone(),
                transferred,
            });
            Ok(transferred)
        }

        /// Proofless path for a pallet moving funds it controls itself.
        pub(crate) fn do_transfer_internal(
            asset: T::AssetId,
            from: &T::AccountId,
            to: &T::AccountId,
            amount: Handle,
        ) -> Handle {
            let transferred = Self::apply_transfer(asset, from, to, amount, None);
            Self::deposit_event(Event::ConfidentialTransfer {
                asset,
                from: from.clone(),
                to: to.clone(),
                transferred,
            });
            transferred
        }

        /// The homomorphic update itself. Both checks (proof, authorization)
        /// have already passed; from here on nothing can fail, so the storage
        /// writes below commit together.
        ///
        /// The moved amount is decided under encryption:
        /// `transferred = from_balance covers amount ? amount : 0`.
        fn apply_transfer(
            asset: T::AssetId,
            from: &T::AccountId,
            to: &T::AccountId,
            amount: Handle,
            operator: Option<&T::AccountId>,
        ) -> Handle {
            let from_balance = Self::confidential_balance_of(asset, from);

            let (covered, _) = T::Fhe::try_sub(from_balance, amount);
            let transferred = T::Fhe::select(covered, amount, ZERO_HANDLE);

            let from_new = T::Fhe::sub(from_balance, transferred);
            // A self-transfer must debit before it credits, not credit the
            // stale balance.
            let to_base = if from == to {
                from_new
            } else {
                Self::confidential_balance_of(asset, to)
            };
            let to_new = T::Fhe::add(to_base, transferred);

            let this = Self::account_id();
            for handle in [from_new, to_new, transferred] {
                T::Acl::allow(handle, from);
                T::Acl::allow(handle, to);
                T::Acl::allow(handle, &this);
                if let Some(op) = operator {
                    T::Acl::allow(handle, op);
                }
            }

            Balances::<T>::insert(asset, from, from_new);
            Balances::<T>::insert(asset, to, to_new);

            log::debug!(
                target: "runtime::confidential-assets",
                "transfer applied: slots re-keyed for sender and receiver"
            );

            transferred
        }
    }
}

impl<T: pallet::Config> ConfidentialLedger<T::AccountId, T::AssetId> for pallet::Pallet<T> {
    fn balance_of(asset: T::AssetId, who: &T::AccountId) -> Handle {
        Self::confidential_balance_of(asset, who)
    }

    fn transfer_from(
        asset: T::AssetId,
        caller: &T::AccountId,
        owner: &T::AccountId,
        to: &T::AccountId,
        amount: Handle,
        proof: &InputProof,
    ) -> Result<Handle, DispatchError> {
        Self::do_transfer_from(asset, caller, owner, to, amount, proof)
    }

    fn transfer(
        asset: T::AssetId,
        from: &T::AccountId,
        to: &T::AccountId,
        amount: Handle,
    ) -> Result<Handle, DispatchError> {
        Ok(Self::do_transfer_internal(asset, from, to, amount))
    }
}
