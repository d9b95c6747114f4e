//! Operators pallet
//!
//! A holder authorizes a delegate ("operator") to move its confidential funds
//! for one asset until an expiry block. The record is pure authorization: no
//! amounts, no balance checks. Consumers gate transfers through the
//! [`OperatorRegistry`] trait; a missing grant is simply "unauthorized", never
//! a fault.
#![cfg_attr(not(feature = "std"), no_std)]

use confidential_primitives::OperatorRegistry;
use frame_support::{pallet_prelude::*, Blake2_128Concat};
use frame_system::pallet_prelude::*;

pub use pallet::*;


#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Asset identifier used by the consuming pallets.
        type AssetId: Parameter + Member + Copy + Ord + MaxEncodedLen;

        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn set_operator() -> Weight;
        fn revoke_operator() -> Weight;
    }
    impl WeightData for () {
        fn set_operator() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn revoke_operator() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }

    /// (holder, asset, operator) -> expiry block. Upserted, never accumulated:
    /// re-granting replaces the previous expiry for the pair.
    #[pallet::storage]
    pub type Operators<T: Config> = StorageNMap<
        _,
        (
            NMapKey<Blake2_128Concat, T::AccountId>,
            NMapKey<Blake2_128Concat, T::AssetId>,
            NMapKey<Blake2_128Concat, T::AccountId>,
        ),
        BlockNumberFor<T>,
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        OperatorSet {
            asset: T::AssetId,
            holder: T::AccountId,
            operator: T::AccountId,
            until: BlockNumberFor<T>,
        },
        OperatorRevoked {
            asset: T::AssetId,
            holder: T::AccountId,
            operator: T::AccountId,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        NoSuchOperator,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    impl<T: Config> Pallet<T> {
        /// Public helper for other pallets.
        pub fn is_operator(
            holder: &T::AccountId,
            asset: &T::AssetId,
            operator: &T::AccountId,
            now: BlockNumberFor<T>,
        ) -> bool {
            Operators::<T>::get((holder, asset, operator)).is_some_and(|until| now <= until)
        }

        /// Raw expiry of a grant, if one exists.
        pub fn operator_expiry(
            holder: &T::AccountId,
            asset: &T::AssetId,
            operator: &T::AccountId,
        ) -> Option<BlockNumberFor<T>> {
            Operators::<T>::get((holder, asset, operator))
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Grant or extend an operator for `asset` until `until`. An `until`
        /// already in the past is accepted and is simply an expired grant.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::set_operator())]
        pub fn set_operator(
            origin: OriginFor<T>,
            asset: T::AssetId,
            operator: T::AccountId,
            until: BlockNumberFor<T>,
        ) -> DispatchResult {
            let holder = ensure_signed(origin)?;
            Operators::<T>::insert((holder.clone(), asset, operator.clone()), until);
            Self::deposit_event(Event::OperatorSet {
                asset,
                holder,
                operator,
                until,
            });
            Ok(())
        }

        /// Remove a grant record entirely.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::revoke_operator())]
        pub fn revoke_operator(
            origin: OriginFor<T>,
            asset: T::AssetId,
            operator: T::AccountId,
        ) -> DispatchResult {
            let holder = ensure_signed(origin)?;
            let key = (holder.clone(), asset, operator.clone());
            ensure!(
                Operators::<T>::contains_key(&key),
                Error::<T>::NoSuchOperator
            );
            Operators::<T>::remove(key);
            Self::deposit_event(Event::OperatorRevoked {
                asset,
                holder,
                operator,
            });
            Ok(())
        }
    }
}

/// Consumers depend only on [`OperatorRegistry`].
impl<T: pallet::Config> OperatorRegistry<T::AccountId, T::AssetId, BlockNumberFor<T>>
    for pallet::Pallet<T>
{
    fn is_operator(
        holder: &T::AccountId,
        asset: &T::AssetId,
        operator: &T::AccountId,
        now: BlockNumberFor<T>,
    ) -> bool {
        <pallet::Pallet<T>>::is_operator(holder, asset, operator, now)
    }
}
