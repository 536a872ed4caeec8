//! Pre-validation shared by both venues.

use std::sync::Arc;

use estate_escrow::DealCustodian;
use estate_ledger::{AssetRegistry, PaymentLedger};
use estate_types::{AssetId, Deal, DealId, DealState, PartyId, Result, SettlementError, VenueId};

pub(crate) struct VenueHandle {
    pub(crate) id: VenueId,
    pub(crate) custodian: Arc<dyn DealCustodian>,
    registry: Arc<AssetRegistry>,
    ledger: Arc<PaymentLedger>,
}

impl VenueHandle {
    pub(crate) fn new(
        id: VenueId,
        custodian: Arc<dyn DealCustodian>,
        registry: Arc<AssetRegistry>,
        ledger: Arc<PaymentLedger>,
    ) -> Self {
        Self {
            id,
            custodian,
            registry,
            ledger,
        }
    }

    /// The lister must own the asset and it must not be locked by a deal.
    pub(crate) fn check_listing(&self, asset_id: AssetId, lister: PartyId) -> Result<()> {
        if self.registry.owner_of(asset_id)? != lister {
            return Err(SettlementError::AssetNotOwned {
                asset: asset_id,
                party: lister,
            });
        }
        if self.registry.is_locked(asset_id)? {
            return Err(SettlementError::AssetLocked(asset_id));
        }
        Ok(())
    }

    /// Snapshot of a deal this venue opened.
    pub(crate) fn own_deal(&self, deal_id: DealId) -> Result<Deal> {
        let deal = self.custodian.deal(deal_id)?;
        if deal.venue != self.id {
            return Err(SettlementError::unauthorized(format!(
                "{deal_id} was not opened through {}",
                self.id
            )));
        }
        Ok(deal)
    }

    /// Refuse a payment the payer obviously cannot cover, before the escrow
    /// is asked to hold it. Only checked for the payer of an open deal.
    pub(crate) fn check_affordable(&self, deal: &Deal, caller: PartyId) -> Result<()> {
        let open = matches!(deal.state, DealState::Created | DealState::Funded);
        if !open || caller != deal.payer {
            return Ok(());
        }
        let needed = deal.terms.installment();
        let available = self.ledger.balance_of(caller);
        if available < needed {
            return Err(SettlementError::InsufficientBalance { needed, available });
        }
        Ok(())
    }
}
