//! # estate-venues
//!
//! **Venue plane**: where deals originate.
//!
//! ## Architecture
//!
//! 1. **SaleVenue**: one-time purchases; the buyer acknowledges delivery
//! 2. **RentalVenue**: term rentals paid period by period
//! 3. **SettlementTopology**: builds ledger, registry, escrow and both venues
//!    in one step, so no deal can exist before the wiring is complete
//!
//! Venues never move funds or title themselves. They pre-validate against
//! the registry and ledger, then delegate to a [`DealCustodian`](estate_escrow::DealCustodian).

pub mod rental;
pub mod sale;
pub mod topology;
mod venue;

pub use rental::RentalVenue;
pub use sale::SaleVenue;
pub use topology::SettlementTopology;
