//! # estate-types
//!
//! Shared types, errors, and configuration for the **estate settlement core**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`PartyId`], [`AssetId`], [`DealId`], [`HoldId`], [`VenueId`]
//! - **Deal model**: [`Deal`], [`DealKind`], [`DealState`], [`DealTerms`], [`Signal`]
//! - **Custody model**: [`BalanceEntry`], [`Hold`], [`HoldState`]
//! - **Journal**: [`Journal`], [`TransitionRecord`], [`Trigger`]
//! - **Configuration**: [`SettlementConfig`], [`EscrowPolicy`], [`EscrowConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`SettlementError`] with `ES_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod clock;
pub mod config;
pub mod constants;
pub mod deal;
pub mod error;
pub mod hold;
pub mod ids;
pub mod journal;

pub use balance::*;
pub use clock::*;
pub use config::*;
pub use deal::*;
pub use error::*;
pub use hold::*;
pub use ids::*;
pub use journal::*;

// Constants are accessed via `estate_types::constants::FOO`
// (not re-exported to avoid name collisions).
