//! Rental venue: term rentals paid one period at a time.
//!
//! The tenant's first `pay_period` funds the deal and starts the term. Each
//! later payment holds the next period and releases elapsed ones to the
//! landlord. The asset stays locked until the final period settles or the
//! rental ends early.

use std::sync::Arc;

use estate_escrow::DealCustodian;
use estate_ledger::{AssetRegistry, PaymentLedger};
use estate_types::{
    AssetId, Deal, DealDescriptor, DealId, DealState, DisputeOutcome, PartyId, RentalDefaults,
    Result, SettlementError, Signal, VenueId,
};
use rust_decimal::Decimal;
use tracing::info;

use crate::venue::VenueHandle;

/// Originates rental deals and forwards tenant and landlord actions to escrow.
pub struct RentalVenue {
    handle: VenueHandle,
    defaults: RentalDefaults,
}

impl RentalVenue {
    #[must_use]
    pub fn new(
        id: VenueId,
        custodian: Arc<dyn DealCustodian>,
        registry: Arc<AssetRegistry>,
        ledger: Arc<PaymentLedger>,
        defaults: RentalDefaults,
    ) -> Self {
        Self {
            handle: VenueHandle::new(id, custodian, registry, ledger),
            defaults,
        }
    }

    #[must_use]
    pub fn id(&self) -> VenueId {
        self.handle.id
    }

    #[must_use]
    pub fn defaults(&self) -> &RentalDefaults {
        &self.defaults
    }

    /// List `asset_id` for rent to `tenant` with the venue's default
    /// period length.
    pub fn create_rental_deal(
        &self,
        landlord: PartyId,
        asset_id: AssetId,
        tenant: PartyId,
        period_amount: Decimal,
        periods: u32,
    ) -> Result<DealId> {
        self.create_rental_deal_with_period(
            landlord,
            asset_id,
            tenant,
            period_amount,
            periods,
            self.defaults.period_length_secs,
        )
    }

    /// # Errors
    /// - `AssetNotOwned` / `AssetLocked` as for sales
    /// - `Configuration` if `periods` exceeds the venue's maximum
    pub fn create_rental_deal_with_period(
        &self,
        landlord: PartyId,
        asset_id: AssetId,
        tenant: PartyId,
        period_amount: Decimal,
        periods: u32,
        period_length_secs: u64,
    ) -> Result<DealId> {
        if periods > self.defaults.max_periods {
            return Err(SettlementError::Configuration(format!(
                "{periods} periods exceeds this venue's limit of {}",
                self.defaults.max_periods
            )));
        }
        self.handle.check_listing(asset_id, landlord)?;
        let deal_id = self.handle.custodian.register_deal(
            self.handle.id,
            DealDescriptor::rental(
                asset_id,
                landlord,
                tenant,
                period_amount,
                periods,
                period_length_secs,
            ),
        )?;
        info!(
            %deal_id,
            %asset_id,
            %landlord,
            %tenant,
            %period_amount,
            periods,
            period_length_secs,
            "rental listed"
        );
        Ok(deal_id)
    }

    /// Tenant pays the next period. The first payment funds the deal.
    /// Returns the zero-based period paid.
    pub fn pay_period(&self, deal_id: DealId, tenant: PartyId) -> Result<u32> {
        let deal = self.handle.own_deal(deal_id)?;
        self.handle.check_affordable(&deal, tenant)?;
        if deal.state == DealState::Created {
            self.handle.custodian.fund(deal_id, tenant)?;
            return Ok(0);
        }
        self.handle.custodian.pay_period(deal_id, tenant)
    }

    /// Either party reports that the current period has run its course.
    pub fn signal_period_elapsed(&self, deal_id: DealId, caller: PartyId) -> Result<DealState> {
        self.forward(deal_id, caller, Signal::PeriodElapsed)
    }

    /// End the rental before its final period.
    pub fn terminate_early(&self, deal_id: DealId, caller: PartyId) -> Result<()> {
        self.handle.own_deal(deal_id)?;
        self.handle.custodian.terminate_early(deal_id, caller)
    }

    /// Withdraw an unfunded rental.
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

    /// Evaluate deadlines and settle elapsed periods now.
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
