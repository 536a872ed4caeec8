//! Deal model: the unit of work tracked end-to-end by the escrow.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  fund   ┌────────┐  acknowledge / final period  ┌───────────┐
//!   │ CREATED ├────────▶│ FUNDED ├─────────────────────────────▶│ COMPLETED │
//!   └────┬────┘         └──┬──┬──┘                              └───────────┘
//!        │ cancel/timeout  │  │ dispute raise / ack timeout          ▲
//!        │                 │  ▼                                      │ release
//!        │                 │ ┌──────────┐────────────────────────────┘
//!        │  cancel/lapse/  │ │ DISPUTED │
//!        │  terminate      │ └────┬─────┘
//!        ▼                 ▼      │ refund
//!   ┌──────────┐◀─────────────────┘
//!   │ REFUNDED │
//!   └──────────┘
//! ```
//!
//! `COMPLETED` and `REFUNDED` are terminal: the deal is archived and every
//! further transition fails with [`SettlementError::DealClosed`].

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    constants, duration_from_secs, AssetId, DealId, HoldId, Journal, PartyId, Result,
    SettlementError, Trigger, VenueId,
};

/// Which venue flow a deal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealKind {
    Sale,
    Rental,
}

impl std::fmt::Display for DealKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sale => write!(f, "SALE"),
            Self::Rental => write!(f, "RENTAL"),
        }
    }
}

/// The lifecycle state of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealState {
    /// Registered by a venue; no funds moved yet.
    Created,
    /// The payer's obligation is held and the asset is locked.
    Funded,
    /// Frozen pending an adjudicator's decision. No funds move.
    Disputed,
    /// Terminal: funds went to the payee (and title to the buyer, for sales).
    Completed,
    /// Terminal: unconsumed funds went back to the payer.
    Refunded,
}

impl DealState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }

    /// Can a deal in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Created, Self::Funded | Self::Refunded)
                | (Self::Funded, Self::Completed | Self::Refunded | Self::Disputed)
                | (Self::Disputed, Self::Completed | Self::Refunded)
        )
    }
}

impl std::fmt::Display for DealState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::Funded => write!(f, "FUNDED"),
            Self::Disputed => write!(f, "DISPUTED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Adjudicator's verdict on a disputed deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeOutcome {
    /// Pay the payee; for sales, transfer title to the buyer.
    Release,
    /// Return held funds to the payer; title stays put.
    Refund,
}

/// External signals a venue forwards to the escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Buyer accepts delivery.
    Acknowledge,
    Cancel,
    /// The current rental period has run its course.
    PeriodElapsed,
    DisputeRaise,
    DisputeResolve(DisputeOutcome),
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Acknowledge => write!(f, "ACKNOWLEDGE"),
            Self::Cancel => write!(f, "CANCEL"),
            Self::PeriodElapsed => write!(f, "PERIOD_ELAPSED"),
            Self::DisputeRaise => write!(f, "DISPUTE_RAISE"),
            Self::DisputeResolve(DisputeOutcome::Release) => write!(f, "DISPUTE_RESOLVE_RELEASE"),
            Self::DisputeResolve(DisputeOutcome::Refund) => write!(f, "DISPUTE_RESOLVE_REFUND"),
        }
    }
}

/// Economic terms agreed when the deal is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealTerms {
    Sale {
        price: Decimal,
    },
    Rental {
        period_amount: Decimal,
        periods: u32,
        period_length_secs: u64,
    },
}

impl DealTerms {
    #[must_use]
    pub fn kind(&self) -> DealKind {
        match self {
            Self::Sale { .. } => DealKind::Sale,
            Self::Rental { .. } => DealKind::Rental,
        }
    }

    /// Full obligation of the payer over the life of the deal.
    ///
    /// # Errors
    /// `InvalidAmount` if the rental total leaves the representable range.
    pub fn total_amount(&self) -> Result<Decimal> {
        match *self {
            Self::Sale { price } => Ok(price),
            Self::Rental {
                period_amount,
                periods,
                ..
            } => period_amount
                .checked_mul(Decimal::from(periods))
                .ok_or(SettlementError::InvalidAmount {
                    amount: period_amount,
                }),
        }
    }

    /// Amount held for one funding step (the price, or one period's rent).
    #[must_use]
    pub fn installment(&self) -> Decimal {
        match *self {
            Self::Sale { price } => price,
            Self::Rental { period_amount, .. } => period_amount,
        }
    }

    /// Number of installments the payer must fund.
    #[must_use]
    pub fn installments(&self) -> u32 {
        match *self {
            Self::Sale { .. } => 1,
            Self::Rental { periods, .. } => periods,
        }
    }

    /// Reject non-positive amounts, out-of-range rental shapes and totals
    /// too large to represent.
    pub fn validate(&self) -> Result<()> {
        let amount = self.installment();
        if amount <= Decimal::ZERO {
            return Err(SettlementError::InvalidAmount { amount });
        }
        if let Self::Rental {
            periods,
            period_length_secs,
            ..
        } = *self
        {
            if periods == 0 || periods > constants::MAX_RENTAL_PERIODS {
                return Err(SettlementError::Configuration(format!(
                    "rental periods must be within 1..={}, got {periods}",
                    constants::MAX_RENTAL_PERIODS
                )));
            }
            if period_length_secs == 0 || period_length_secs > constants::MAX_DURATION_SECS {
                return Err(SettlementError::Configuration(format!(
                    "rental period length out of range: {period_length_secs}s"
                )));
            }
        }
        self.total_amount()?;
        Ok(())
    }
}

/// What a venue submits to open a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDescriptor {
    pub asset_id: AssetId,
    /// Buyer or tenant.
    pub payer: PartyId,
    /// Seller or landlord; must own the asset.
    pub payee: PartyId,
    pub terms: DealTerms,
}

impl DealDescriptor {
    #[must_use]
    pub fn sale(asset_id: AssetId, seller: PartyId, buyer: PartyId, price: Decimal) -> Self {
        Self {
            asset_id,
            payer: buyer,
            payee: seller,
            terms: DealTerms::Sale { price },
        }
    }

    #[must_use]
    pub fn rental(
        asset_id: AssetId,
        landlord: PartyId,
        tenant: PartyId,
        period_amount: Decimal,
        periods: u32,
        period_length_secs: u64,
    ) -> Self {
        Self {
            asset_id,
            payer: tenant,
            payee: landlord,
            terms: DealTerms::Rental {
                period_amount,
                periods,
                period_length_secs,
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> DealKind {
        self.terms.kind()
    }
}

/// Dummy descriptors for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl DealDescriptor {
    /// A sale between fresh parties on a fresh asset.
    #[must_use]
    pub fn dummy_sale(price: Decimal) -> Self {
        Self::sale(AssetId::new(), PartyId::new(), PartyId::new(), price)
    }

    /// A rental between fresh parties on a fresh asset, one-day periods.
    #[must_use]
    pub fn dummy_rental(period_amount: Decimal, periods: u32) -> Self {
        Self::rental(
            AssetId::new(),
            PartyId::new(),
            PartyId::new(),
            period_amount,
            periods,
            86_400,
        )
    }
}

/// A hold owned by a deal. Sales have one, at period 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealHold {
    pub hold_id: HoldId,
    pub period: u32,
    pub amount: Decimal,
}

/// Rental bookkeeping. Periods are zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalProgress {
    /// Periods the tenant has funded so far.
    pub periods_paid: u32,
    /// Periods whose hold has gone to the landlord.
    pub periods_settled: u32,
    /// Start of period 0; set when the first period is funded.
    pub term_started_at: Option<DateTime<Utc>>,
}

/// A sale or rental agreement and everything the escrow knows about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    /// Venue that registered the deal.
    pub venue: VenueId,
    pub asset_id: AssetId,
    pub payer: PartyId,
    pub payee: PartyId,
    pub terms: DealTerms,
    pub state: DealState,
    /// Active holds backing this deal, oldest first.
    pub holds: Vec<DealHold>,
    pub rental: Option<RentalProgress>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub funded_at: Option<DateTime<Utc>>,
    pub journal: Journal,
}

impl Deal {
    /// A freshly registered deal in `CREATED`.
    #[must_use]
    pub fn open(venue: VenueId, descriptor: DealDescriptor, now: DateTime<Utc>) -> Self {
        let id = DealId::new();
        let rental = match descriptor.terms {
            DealTerms::Rental { .. } => Some(RentalProgress::default()),
            DealTerms::Sale { .. } => None,
        };
        let mut journal = Journal::default();
        journal.append(id, DealState::Created, DealState::Created, Trigger::Register, now);
        Self {
            id,
            venue,
            asset_id: descriptor.asset_id,
            payer: descriptor.payer,
            payee: descriptor.payee,
            terms: descriptor.terms,
            state: DealState::Created,
            holds: Vec::new(),
            rental,
            created_at: now,
            updated_at: now,
            funded_at: None,
            journal,
        }
    }

    #[must_use]
    pub fn kind(&self) -> DealKind {
        self.terms.kind()
    }

    /// The party who listed the deal through a venue (seller or landlord).
    #[must_use]
    pub fn initiator(&self) -> PartyId {
        self.payee
    }

    /// The party the deal was offered to (buyer or tenant).
    #[must_use]
    pub fn counterparty(&self) -> PartyId {
        self.payer
    }

    #[must_use]
    pub fn is_party(&self, party: PartyId) -> bool {
        party == self.payer || party == self.payee
    }

    /// Sum of the amounts still held for this deal.
    #[must_use]
    pub fn held_amount(&self) -> Decimal {
        self.holds.iter().map(|h| h.amount).sum()
    }

    /// Length of one rental period.
    #[must_use]
    pub fn period_length(&self) -> Option<TimeDelta> {
        match self.terms {
            DealTerms::Rental {
                period_length_secs, ..
            } => Some(duration_from_secs(period_length_secs)),
            DealTerms::Sale { .. } => None,
        }
    }

    /// End of rental period `period` (zero-based), once the term has started.
    #[must_use]
    pub fn period_end(&self, period: u32) -> Option<DateTime<Utc>> {
        let start = self.rental.as_ref()?.term_started_at?;
        let length = self.period_length()?;
        let factor = i32::try_from(period.checked_add(1)?).ok()?;
        start.checked_add_signed(length.checked_mul(factor)?)
    }

    /// Fails with `DealClosed` once the deal is archived.
    pub fn ensure_open(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(SettlementError::DealClosed {
                deal: self.id,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Move to `target`, journaling the trigger.
    ///
    /// # Errors
    /// `DealClosed` from a terminal state, `InvalidTransition` when the
    /// state machine has no such edge.
    pub fn transition(
        &mut self,
        target: DealState,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        if !self.state.can_transition_to(target) {
            return Err(SettlementError::invalid_transition(
                self.state,
                format!("no edge to {target} on {trigger}"),
            ));
        }
        let from = self.state;
        self.state = target;
        self.updated_at = now;
        self.journal.append(self.id, from, target, trigger, now);
        Ok(())
    }

    /// Journal a custody movement that leaves the state unchanged.
    pub fn record(&mut self, trigger: Trigger, now: DateTime<Utc>) {
        self.updated_at = now;
        self.journal
            .append(self.id, self.state, self.state, trigger, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_deal() -> Deal {
        Deal::open(
            VenueId::new(),
            DealDescriptor::dummy_sale(Decimal::new(100, 0)),
            Utc::now(),
        )
    }

    #[test]
    fn state_edges() {
        assert!(DealState::Created.can_transition_to(DealState::Funded));
        assert!(DealState::Created.can_transition_to(DealState::Refunded));
        assert!(DealState::Funded.can_transition_to(DealState::Disputed));
        assert!(DealState::Disputed.can_transition_to(DealState::Completed));
        assert!(!DealState::Created.can_transition_to(DealState::Completed));
        assert!(!DealState::Created.can_transition_to(DealState::Disputed));
        assert!(!DealState::Disputed.can_transition_to(DealState::Funded));
        assert!(!DealState::Completed.can_transition_to(DealState::Refunded));
    }

    #[test]
    fn open_deal_is_created_with_register_record() {
        let deal = sale_deal();
        assert_eq!(deal.state, DealState::Created);
        assert_eq!(deal.kind(), DealKind::Sale);
        assert_eq!(deal.journal.len(), 1);
        assert!(deal.rental.is_none());
        assert_eq!(deal.initiator(), deal.payee);
        assert_eq!(deal.counterparty(), deal.payer);
    }

    #[test]
    fn terminal_transition_is_deal_closed() {
        let mut deal = sale_deal();
        let now = Utc::now();
        deal.transition(DealState::Refunded, Trigger::Signal(Signal::Cancel), now)
            .unwrap();
        let err = deal
            .transition(DealState::Funded, Trigger::Fund, now)
            .unwrap_err();
        assert!(matches!(err, SettlementError::DealClosed { .. }));
    }

    #[test]
    fn missing_edge_is_invalid_transition() {
        let mut deal = sale_deal();
        let err = deal
            .transition(DealState::Completed, Trigger::Signal(Signal::Acknowledge), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InvalidTransition {
                state: DealState::Created,
                ..
            }
        ));
    }

    #[test]
    fn terms_validation() {
        assert!(DealTerms::Sale { price: Decimal::ZERO }.validate().is_err());
        assert!(
            DealTerms::Rental {
                period_amount: Decimal::TEN,
                periods: 0,
                period_length_secs: 60,
            }
            .validate()
            .is_err()
        );
        assert!(
            DealTerms::Rental {
                period_amount: Decimal::TEN,
                periods: 3,
                period_length_secs: 60,
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn rental_total_overflow_is_rejected() {
        let terms = DealTerms::Rental {
            period_amount: Decimal::MAX / Decimal::TWO,
            periods: 3,
            period_length_secs: 60,
        };
        assert!(matches!(
            terms.total_amount(),
            Err(SettlementError::InvalidAmount { .. })
        ));
        assert!(matches!(
            terms.validate(),
            Err(SettlementError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn rental_total_and_installment() {
        let terms = DealTerms::Rental {
            period_amount: Decimal::TEN,
            periods: 3,
            period_length_secs: 60,
        };
        assert_eq!(terms.total_amount().unwrap(), Decimal::new(30, 0));
        assert_eq!(terms.installment(), Decimal::TEN);
        assert_eq!(terms.installments(), 3);
    }

    #[test]
    fn period_end_follows_term_start() {
        let mut deal = Deal::open(
            VenueId::new(),
            DealDescriptor::dummy_rental(Decimal::TEN, 3),
            Utc::now(),
        );
        assert!(deal.period_end(0).is_none());
        let start = Utc::now();
        deal.rental.as_mut().unwrap().term_started_at = Some(start);
        assert_eq!(deal.period_end(0), Some(start + TimeDelta::days(1)));
        assert_eq!(deal.period_end(2), Some(start + TimeDelta::days(3)));
    }
}
