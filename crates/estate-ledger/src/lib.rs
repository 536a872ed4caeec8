//! # estate-ledger
//!
//! **Custody plane**: the two leaf dependencies of the escrow.
//!
//! ## Architecture
//!
//! 1. **PaymentLedger**: per-party available/held balances of the payment
//!    token, plus single-use holds
//! 2. **AssetRegistry**: canonical owner of every property asset, with
//!    escrow-only locks keyed by a [`CustodyKey`]
//! 3. **SupplyConservation**: `Σ(available + held) == minted − burned`
//!
//! ## Locking
//!
//! No global lock. Each party balance, hold and asset sits behind its own
//! `parking_lot::Mutex`; the maps only guard membership. Two-party moves
//! lock both parties in ascending [`PartyId`](estate_types::PartyId) order.

pub mod asset_registry;
pub mod payment_ledger;
pub mod supply_conservation;

pub use asset_registry::{AssetRecord, AssetRegistry, CustodyKey};
pub use payment_ledger::PaymentLedger;
pub use supply_conservation::SupplyConservation;
