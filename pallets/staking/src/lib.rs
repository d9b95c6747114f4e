//! Confidential staking pallet
//!
//! Moves encrypted balances between a holder's wallet slot on the ledger and
//! a stake position held here, without any amount appearing in plaintext.
//!
//! The pallet's sovereign account is its identity on the ledger: staked funds
//! pool under that account on the wallet side, while per-(asset, holder)
//! positions are tracked in this pallet's own storage. Staking pulls funds in
//! through the ledger's operator path, which is why a holder must first call
//! `set_operator` for the pool account; unstaking verifies the caller's proof
//! here and pays back out of the pool, which needs no operator since the
//! pallet moves its own funds.
#![cfg_attr(not(feature = "std"), no_std)]

use confidential_primitives::{
    ConfidentialLedger, DecryptionAcl, FheEngine, Handle, InputProof, ZERO_HANDLE,
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

        /// Where decryption grants for new position handles are recorded.
        type Acl: DecryptionAcl<Self::AccountId>;

        /// The wallet-side ledger this pallet stakes against.
        type Ledger: ConfidentialLedger<Self::AccountId, Self::AssetId>;

        /// Sovereign account holding the pooled wallet-side balance and
        /// serving as proof context for unstakes.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn stake() -> Weight;
        fn unstake() -> Weight;
    }
    impl WeightData for () {
        fn stake() -> Weight {
            Weight::from_parts(25_000, 0)
        }
        fn unstake() -> Weight {
            Weight::from_parts(27_000, 0)
        }
    }

    /// Stake positions: (asset, holder) -> current handle. Disjoint from the
    /// ledger's wallet balances; a position only ever moves to a fresh handle.
    #[pallet::storage]
    pub type Staked<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        Handle,
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        Staked {
            asset: T::AssetId,
            who: T::AccountId,
            amount: Handle,
        },
        Unstaked {
            asset: T::AssetId,
            who: T::AccountId,
            amount: Handle,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Input proof does not match (ciphertext, staking pool, submitter).
        ProofInvalid,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    // ---------- Read helpers ----------
    impl<T: Config> Pallet<T> {
        /// Current stake position handle; the zero sentinel if never staked.
        pub fn confidential_staked_of(asset: T::AssetId, who: &T::AccountId) -> Handle {
            Staked::<T>::get(asset, who).unwrap_or(ZERO_HANDLE)
        }

        /// The pool account: this pallet's identity on the ledger.
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Pull an encrypted amount from the caller's wallet balance into the
        /// pool and grow the caller's stake position by the amount actually
        /// moved. Requires the caller to have made the pool account an
        /// operator on the ledger first; failures surface unchanged and are
        /// never retried here.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::stake())]
        pub fn stake(
            origin: OriginFor<T>,
            asset: T::AssetId,
            amount: Handle,
            proof: InputProof,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let pool = Self::account_id();

            let staked = T::Ledger::transfer_from(asset, &pool, &who, &pool, amount, &proof)?;

            let position = Self::confidential_staked_of(asset, &who);
            let new_position = T::Fhe::add(position, staked);
            T::Acl::allow(new_position, &who);
            T::Acl::allow(new_position, &pool);
            Staked::<T>::insert(asset, &who, new_position);

            log::debug!(
                target: "runtime::confidential-staking",
                "stake applied: position re-keyed"
            );

            Self::deposit_event(Event::Staked {
                asset,
                who,
                amount: staked,
            });
            Ok(())
        }

        /// Release an encrypted amount from the caller's stake position back
        /// to its wallet balance. The amount actually withdrawn is decided
        /// under encryption: a position that does not cover the request
        /// releases an encrypted zero.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::unstake())]
        pub fn unstake(
            origin: OriginFor<T>,
            asset: T::AssetId,
            amount: Handle,
            proof: InputProof,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            let pool = Self::account_id();

            ensure!(
                T::Fhe::verify_input(amount, &pool, &who, &proof),
                Error::<T>::ProofInvalid
            );

            let position = Self::confidential_staked_of(asset, &who);
            let (covered, _) = T::Fhe::try_sub(position, amount);
            let withdrawn = T::Fhe::select(covered, amount, ZERO_HANDLE);
            let new_position = T::Fhe::sub(position, withdrawn);

            for handle in [new_position, withdrawn] {
                T::Acl::allow(handle, &who);
                T::Acl::allow(handle, &pool);
            }
            Staked::<T>::insert(asset, &who, new_position);

            // Pool pays the holder back on the wallet side. The pallet moves
            // its own pooled funds, so no operator grant is involved.
            T::Ledger::transfer(asset, &pool, &who, withdrawn)?;

            log::debug!(
                target: "runtime::confidential-staking",
                "unstake applied: position re-keyed"
            );

            Self::deposit_event(Event::Unstaked {
                asset,
                who,
                amount: withdrawn,
            });
            Ok(())
        }
    }
}
