//! One-step assembly of the settlement graph.
//!
//! Ledger, registry, escrow and both venues are created together. Venue
//! identities are minted first, the escrow is built from a complete
//! [`EscrowConfig`], and only then are the venues handed the escrow. There
//! is no window in which a venue exists without a configured escrow.

use std::sync::Arc;

use estate_escrow::{DealCustodian, Escrow};
use estate_ledger::{AssetRegistry, PaymentLedger};
use estate_types::{
    constants, Clock, EscrowConfig, PartyId, Result, SettlementConfig, SystemClock, VenueId,
};
use tracing::info;

use crate::{RentalVenue, SaleVenue};

/// A fully wired settlement deployment.
pub struct SettlementTopology {
    ledger: Arc<PaymentLedger>,
    registry: Arc<AssetRegistry>,
    escrow: Arc<Escrow>,
    sale: SaleVenue,
    rental: RentalVenue,
}

impl SettlementTopology {
    /// Assemble a fresh deployment on the wall clock.
    pub fn assemble(config: &SettlementConfig, adjudicator: PartyId) -> Result<Self> {
        Self::assemble_with_clock(config, adjudicator, Arc::new(SystemClock))
    }

    /// Assemble a fresh deployment on `clock`.
    pub fn assemble_with_clock(
        config: &SettlementConfig,
        adjudicator: PartyId,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::assemble_over(
            config,
            adjudicator,
            Arc::new(PaymentLedger::new()),
            Arc::new(AssetRegistry::with_clock(Arc::clone(&clock))),
            clock,
        )
    }

    /// Assemble over an existing ledger and registry.
    ///
    /// # Errors
    /// - `Configuration` if `config` fails validation
    /// - `Unauthorized` if `registry` is already bound to another escrow
    pub fn assemble_over(
        config: &SettlementConfig,
        adjudicator: PartyId,
        ledger: Arc<PaymentLedger>,
        registry: Arc<AssetRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let sale_id = VenueId::new();
        let rental_id = VenueId::new();
        let escrow_config = EscrowConfig::builder()
            .sale_venue(sale_id)
            .rental_venue(rental_id)
            .adjudicator(adjudicator)
            .policy(config.escrow.clone())
            .build()?;
        let escrow = Arc::new(Escrow::new(
            escrow_config,
            Arc::clone(&ledger),
            Arc::clone(&registry),
            clock,
        )?);

        let custodian: Arc<dyn DealCustodian> = escrow.clone();
        let sale = SaleVenue::new(
            sale_id,
            Arc::clone(&custodian),
            Arc::clone(&registry),
            Arc::clone(&ledger),
        );
        let rental = RentalVenue::new(
            rental_id,
            custodian,
            Arc::clone(&registry),
            Arc::clone(&ledger),
            config.rental.clone(),
        );

        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            sale_venue = %sale_id,
            rental_venue = %rental_id,
            %adjudicator,
            "settlement topology assembled"
        );
        Ok(Self {
            ledger,
            registry,
            escrow,
            sale,
            rental,
        })
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<PaymentLedger> {
        &self.ledger
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<AssetRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn escrow(&self) -> &Arc<Escrow> {
        &self.escrow
    }

    #[must_use]
    pub fn sale(&self) -> &SaleVenue {
        &self.sale
    }

    #[must_use]
    pub fn rental(&self) -> &RentalVenue {
        &self.rental
    }

    #[must_use]
    pub fn adjudicator(&self) -> PartyId {
        self.escrow.config().adjudicator
    }
}
