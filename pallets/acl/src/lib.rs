//! Decryption ACL pallet
//!
//! Records which principals may ask the off-chain decryption service for the
//! plaintext behind a ciphertext handle. The ledger and staking pallets write
//! grants through the [`DecryptionAcl`] trait whenever they produce a new
//! handle; the service consults [`Pallet::can_decrypt`] before serving a
//! request.
//!
//! Grants are append-only. A handle is superseded (a mutation yields a fresh
//! handle), never edited, so revoking access to a dead handle buys nothing and
//! no revocation call exists.
#![cfg_attr(not(feature = "std"), no_std)]

use confidential_primitives::{DecryptionAcl, Handle};
use frame_support::{pallet_prelude::*, Blake2_128Concat};
use frame_system::pallet_prelude::*;

pub use pallet::*;

#[cfg(test)]
mod tests;

#[frame_support::pallet]
pub mod pallet {
    use super::*;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type WeightInfo: WeightData;
    }

    pub trait WeightData {
        fn allow() -> Weight;
    }
    impl WeightData for () {
        fn allow() -> Weight {
            Weight::from_parts(10_000, 0)
        }
    }

    /// (handle, principal) -> permitted. Entries are only ever inserted.
    #[pallet::storage]
    pub type Permissions<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        Handle,
        Blake2_128Concat,
        T::AccountId,
        (),
        OptionQuery,
    >;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        AccessGranted {
            handle: Handle,
            who: T::AccountId,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// Caller may not decrypt the handle it is trying to share.
        AccessDenied,
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Share decryption access: a principal that can already decrypt
        /// `handle` extends that right to `who`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::allow())]
        pub fn allow(origin: OriginFor<T>, handle: Handle, who: T::AccountId) -> DispatchResult {
            let caller = ensure_signed(origin)?;
            ensure!(
                Permissions::<T>::contains_key(handle, &caller),
                Error::<T>::AccessDenied
            );
            Self::grant(handle, &who);
            Ok(())
        }
    }

    impl<T: Config> Pallet<T> {
        /// Gate for the decryption service.
        pub fn can_decrypt(handle: Handle, who: &T::AccountId) -> bool {
            Permissions::<T>::contains_key(handle, who)
        }

        pub(crate) fn grant(handle: Handle, who: &T::AccountId) {
            if Permissions::<T>::contains_key(handle, who) {
                return;
            }
            Permissions::<T>::insert(handle, who, ());
            Self::deposit_event(Event::AccessGranted {
                handle,
                who: who.clone(),
            });
        }
    }
}

impl<T: pallet::Config> DecryptionAcl<T::AccountId> for pallet::Pallet<T> {
    fn allow(handle: Handle, who: &T::AccountId) {
        <pallet::Pallet<T>>::grant(handle, who);
    }

    fn is_allowed(handle: Handle, who: &T::AccountId) -> bool {
        <pallet::Pallet<T>>::can_decrypt(handle, who)
    }
}
