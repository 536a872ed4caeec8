//! The seam between venues and the escrow.

use estate_types::{Deal, DealDescriptor, DealId, DealState, PartyId, Result, Signal, VenueId};

/// What a venue may ask of the escrow.
///
/// Venues hold an `Arc<dyn DealCustodian>`; the escrow knows venues only by
/// their [`VenueId`].
pub trait DealCustodian: Send + Sync {
    /// Open a deal in `CREATED`. The venue must be the one configured for
    /// the descriptor's kind.
    fn register_deal(&self, venue: VenueId, descriptor: DealDescriptor) -> Result<DealId>;

    /// Hold the payer's first installment and lock the asset.
    fn fund(&self, deal: DealId, caller: PartyId) -> Result<()>;

    /// Hold the next rental period. Returns the zero-based period index.
    fn pay_period(&self, deal: DealId, caller: PartyId) -> Result<u32>;

    /// End a funded rental before its final period.
    fn terminate_early(&self, deal: DealId, caller: PartyId) -> Result<()>;

    /// Forward a party's or the adjudicator's signal.
    fn signal(&self, deal: DealId, caller: PartyId, signal: Signal) -> Result<DealState>;

    /// Apply any deadline that has passed and settle elapsed rent.
    fn check_deadlines(&self, deal: DealId) -> Result<DealState>;

    /// Snapshot of a deal.
    fn deal(&self, deal: DealId) -> Result<Deal>;
}
