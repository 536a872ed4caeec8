//! Sale venue ("marketplace"): one-time purchases.
//!
//! ```text
//! seller: create_sale_deal ─▶ buyer: fund ─▶ buyer: confirm_delivery ─▶ COMPLETED
//!              │                  │
//!              └── cancel ◀───────┘ (seller only once funded)
//! ```

use std::sync::Arc;

use estate_escrow::DealCustodian;
use estate_ledger::{AssetRegistry, PaymentLedger};
use estate_types::{
    AssetId, Deal, DealDescriptor, DealId, DealState, DisputeOutcome, PartyId, Result, Signal,
    VenueId,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::venue::VenueHandle;

/// Originates sale deals and forwards buyer and seller actions to escrow.
pub struct SaleVenue {
    handle: VenueHandle,
}

impl SaleVenue {
    #[must_use]
    pub fn new(
        id: VenueId,
        custodian: Arc<dyn DealCustodian>,
        registry: Arc<AssetRegistry>,
        ledger: Arc<PaymentLedger>,
    ) -> Self {
        Self {
            handle: VenueHandle::new(id, custodian, registry, ledger),
        }
    }

    #[must_use]
    pub fn id(&self) -> VenueId {
        self.handle.id
    }

    /// List `asset_id` for sale to `buyer` at `price`.
    ///
    /// # Errors
    /// - `AssetNotOwned` if `seller` is not the current owner
    /// - `AssetLocked` if the asset is under an active deal
    /// - `InvalidAmount` for a non-positive price
    pub fn create_sale_deal(
        &self,
        seller: PartyId,
        asset_id: AssetId,
        buyer: PartyId,
        price: Decimal,
    ) -> Result<DealId> {
        self.handle.check_listing(asset_id, seller)?;
        let deal_id = self.handle.custodian.register_deal(
            self.handle.id,
            DealDescriptor::sale(asset_id, seller, buyer, price),
        )?;
        info!(%deal_id, %asset_id, %seller, %buyer, %price, "sale listed");
        Ok(deal_id)
    }

    /// Buyer pays the price into escrow.
    ///
    /// # Errors
    /// `InsufficientBalance` if the buyer's spendable balance is short,
    /// otherwise whatever the escrow rejects.
    pub fn fund(&self, deal_id: DealId, buyer: PartyId) -> Result<()> {
        let deal = self.handle.own_deal(deal_id)?;
        self.handle.check_affordable(&deal, buyer)?;
        self.handle.custodian.fund(deal_id, buyer)
    }

    /// Buyer accepts delivery: title moves to the buyer and the price to
    /// the seller.
    pub fn confirm_delivery(&self, deal_id: DealId, buyer: PartyId) -> Result<DealState> {
        self.forward(deal_id, buyer, Signal::Acknowledge)
    }

    /// Cancel before funding (either party) or before acknowledgment
    /// (seller only).
    pub fn cancel(&self, deal_id: DealId, caller: PartyId) -> Result<DealState> {
        self.forward(deal_id, caller, Signal::Cancel)
    }

    pub fn raise_dispute(&self, deal_id: DealId, caller: PartyId) -> Result<DealState> {
        self.forward(deal_id, caller, Signal::DisputeRaise)
    }

    pub fn resolve_dispute(
        &self,
        deal_id: DealId,
        adjudicator: PartyId,
        outcome: DisputeOutcome,
    ) -> Result<DealState> {
        self.forward(deal_id, adjudicator, Signal::DisputeResolve(outcome))
    }

    /// Evaluate the deal's deadlines now.
    pub fn check_deadlines(&self, deal_id: DealId) -> Result<DealState> {
        self.handle.own_deal(deal_id)?;
        self.handle.custodian.check_deadlines(deal_id)
    }

    pub fn deal(&self, deal_id: DealId) -> Result<Deal> {
        self.handle.own_deal(deal_id)
    }

    fn forward(&self, deal_id: DealId, caller: PartyId, signal: Signal) -> Result<DealState> {
        self.handle.own_deal(deal_id)?;
        self.handle.custodian.signal(deal_id, caller, signal)
    }
}
