//! # estate-escrow
//!
//! **Custody plane**: the escrow every venue delegates fund custody to.
//!
//! ## Architecture
//!
//! 1. **Escrow**: per-deal state machine over the ledger and the registry
//! 2. **DealCustodian**: the narrow trait venues hold instead of the escrow
//! 3. **deadlines**: funding, acknowledgment and payment-lapse timeouts,
//!    evaluated lazily on the next interaction with a deal
//! 4. **rental**: period boundaries and early-termination proration
//!
//! ## Deal Flow
//!
//! ```text
//! Venue → register_deal() → CREATED → fund() → FUNDED ─┬─ acknowledge / final period → COMPLETED
//!                                                      ├─ cancel / terminate / lapse  → REFUNDED
//!                                                      └─ dispute → DISPUTED → adjudicator
//! ```
//!
//! Every transition is appended to the deal's hash-chained journal.

pub mod custodian;
pub mod deadlines;
pub mod escrow;
pub mod rental;

pub use custodian::DealCustodian;
pub use deadlines::Deadline;
pub use escrow::Escrow;
