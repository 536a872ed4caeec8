//! Deadline evaluation.
//!
//! There is no scheduler. Each deal has at most one pending deadline at a
//! time, derived from its state and the [`EscrowPolicy`]; the escrow checks
//! it whenever the deal is touched.

use chrono::{DateTime, Utc};
use estate_types::{Deal, DealKind, DealState, EscrowPolicy, Trigger};

/// A timeout that can fire on a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// `CREATED` for longer than the funding timeout → `REFUNDED`.
    Funding,
    /// Funded sale unacknowledged past the acknowledgment timeout → `DISPUTED`.
    Acknowledgment,
    /// Rental whose next period is still unpaid after the grace window → `REFUNDED`.
    PaymentLapse,
}

impl Deadline {
    #[must_use]
    pub fn trigger(self) -> Trigger {
        match self {
            Self::Funding => Trigger::FundingTimeout,
            Self::Acknowledgment => Trigger::AcknowledgmentTimeout,
            Self::PaymentLapse => Trigger::PaymentLapse,
        }
    }

    /// State the deal lands in when this deadline fires.
    #[must_use]
    pub fn target(self) -> DealState {
        match self {
            Self::Funding | Self::PaymentLapse => DealState::Refunded,
            Self::Acknowledgment => DealState::Disputed,
        }
    }
}

/// The deadline currently pending on `deal`, and when it fires.
#[must_use]
pub fn next_deadline(deal: &Deal, policy: &EscrowPolicy) -> Option<(Deadline, DateTime<Utc>)> {
    match (deal.state, deal.kind()) {
        (DealState::Created, _) => deal
            .created_at
            .checked_add_signed(policy.funding_timeout())
            .map(|at| (Deadline::Funding, at)),
        (DealState::Funded, DealKind::Sale) => deal
            .funded_at?
            .checked_add_signed(policy.acknowledgment_timeout())
            .map(|at| (Deadline::Acknowledgment, at)),
        (DealState::Funded, DealKind::Rental) => {
            let paid = deal.rental.as_ref()?.periods_paid;
            if paid == 0 || paid >= deal.terms.installments() {
                return None;
            }
            deal.period_end(paid - 1)?
                .checked_add_signed(policy.payment_grace())
                .map(|at| (Deadline::PaymentLapse, at))
        }
        _ => None,
    }
}

/// The deadline that has fired on `deal` by `now`, if any.
#[must_use]
pub fn due(deal: &Deal, policy: &EscrowPolicy, now: DateTime<Utc>) -> Option<Deadline> {
    next_deadline(deal, policy)
        .filter(|(_, at)| now >= *at)
        .map(|(deadline, _)| deadline)
}
