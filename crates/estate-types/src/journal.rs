//! Per-deal transition journal.
//!
//! Every state change and every custody movement on a deal appends a
//! [`TransitionRecord`]. Records are hash-chained: each digest commits to the
//! previous one, so an archived deal's history can be re-verified end to end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{constants, DealId, DealState, DisputeOutcome, Signal};

/// What caused a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    /// The venue registered the deal.
    Register,
    /// The sale price was held.
    Fund,
    /// Rent for `period` was held.
    PayPeriod { period: u32 },
    /// Rent for `period` went to the landlord.
    PeriodSettled { period: u32 },
    /// A venue forwarded a party's or adjudicator's signal.
    Signal(Signal),
    /// A `CREATED` deal was never funded in time.
    FundingTimeout,
    /// A funded sale was never acknowledged in time.
    AcknowledgmentTimeout,
    /// The tenant stopped paying rent.
    PaymentLapse,
    /// A party ended the rental before its final period.
    TerminateEarly,
    /// The final rental period settled during a deadline check.
    TermComplete,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register => write!(f, "REGISTER"),
            Self::Fund => write!(f, "FUND"),
            Self::PayPeriod { period } => write!(f, "PAY_PERIOD[{period}]"),
            Self::PeriodSettled { period } => write!(f, "PERIOD_SETTLED[{period}]"),
            Self::Signal(signal) => write!(f, "SIGNAL[{signal}]"),
            Self::FundingTimeout => write!(f, "FUNDING_TIMEOUT"),
            Self::AcknowledgmentTimeout => write!(f, "ACKNOWLEDGMENT_TIMEOUT"),
            Self::PaymentLapse => write!(f, "PAYMENT_LAPSE"),
            Self::TerminateEarly => write!(f, "TERMINATE_EARLY"),
            Self::TermComplete => write!(f, "TERM_COMPLETE"),
        }
    }
}

impl Trigger {
    /// The dispute verdict carried by this trigger, if any.
    #[must_use]
    pub fn dispute_outcome(&self) -> Option<DisputeOutcome> {
        match self {
            Self::Signal(Signal::DisputeResolve(outcome)) => Some(*outcome),
            _ => None,
        }
    }
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Position in the journal, starting at 0.
    pub seq: u64,
    pub from: DealState,
    pub to: DealState,
    pub trigger: Trigger,
    pub at: DateTime<Utc>,
    /// SHA-256 over the previous digest and this record's fields.
    pub digest: [u8; 32],
}

/// Append-only, hash-chained list of [`TransitionRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    records: Vec<TransitionRecord>,
}

impl Journal {
    pub fn append(
        &mut self,
        deal_id: DealId,
        from: DealState,
        to: DealState,
        trigger: Trigger,
        at: DateTime<Utc>,
    ) {
        let seq = self.records.len() as u64;
        let prev = self.head().unwrap_or([0u8; 32]);
        let digest = record_digest(&prev, deal_id, seq, from, to, trigger, at);
        self.records.push(TransitionRecord {
            seq,
            from,
            to,
            trigger,
            at,
            digest,
        });
    }

    /// Digest of the latest record.
    #[must_use]
    pub fn head(&self) -> Option<[u8; 32]> {
        self.records.last().map(|r| r.digest)
    }

    /// Hex form of [`Journal::head`], for logs.
    #[must_use]
    pub fn head_hex(&self) -> String {
        self.head().map(hex::encode).unwrap_or_default()
    }

    /// Recompute the chain and compare every stored digest.
    #[must_use]
    pub fn verify(&self, deal_id: DealId) -> bool {
        let mut prev = [0u8; 32];
        for (i, r) in self.records.iter().enumerate() {
            if r.seq != i as u64 {
                return false;
            }
            let expected = record_digest(&prev, deal_id, r.seq, r.from, r.to, r.trigger, r.at);
            if expected != r.digest {
                return false;
            }
            prev = r.digest;
        }
        true
    }

    #[must_use]
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Tamper hook for tests that need a broken chain.
    #[cfg(any(test, feature = "test-helpers"))]
    pub fn records_mut(&mut self) -> &mut Vec<TransitionRecord> {
        &mut self.records
    }
}

fn record_digest(
    prev: &[u8; 32],
    deal_id: DealId,
    seq: u64,
    from: DealState,
    to: DealState,
    trigger: Trigger,
    at: DateTime<Utc>,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::JOURNAL_DOMAIN);
    hasher.update(prev);
    hasher.update(deal_id.as_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(from.to_string().as_bytes());
    hasher.update(to.to_string().as_bytes());
    hasher.update(trigger.to_string().as_bytes());
    hasher.update(at.timestamp_millis().to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(deal: DealId) -> Journal {
        let now = Utc::now();
        let mut journal = Journal::default();
        journal.append(deal, DealState::Created, DealState::Created, Trigger::Register, now);
        journal.append(deal, DealState::Created, DealState::Funded, Trigger::Fund, now);
        journal.append(
            deal,
            DealState::Funded,
            DealState::Completed,
            Trigger::Signal(Signal::Acknowledge),
            now,
        );
        journal
    }

    #[test]
    fn chain_verifies() {
        let deal = DealId::new();
        let journal = sample(deal);
        assert_eq!(journal.len(), 3);
        assert!(journal.verify(deal));
        assert_eq!(journal.head_hex().len(), 64);
    }

    #[test]
    fn chain_is_bound_to_deal() {
        let journal = sample(DealId::new());
        assert!(!journal.verify(DealId::new()));
    }

    #[test]
    fn tampering_breaks_chain() {
        let deal = DealId::new();
        let mut journal = sample(deal);
        journal.records_mut()[1].to = DealState::Refunded;
        assert!(!journal.verify(deal));
    }

    #[test]
    fn trigger_display() {
        assert_eq!(Trigger::PayPeriod { period: 2 }.to_string(), "PAY_PERIOD[2]");
        assert_eq!(
            Trigger::Signal(Signal::DisputeResolve(DisputeOutcome::Refund)).to_string(),
            "SIGNAL[DISPUTE_RESOLVE_REFUND]"
        );
    }

    #[test]
    fn dispute_outcome_extraction() {
        let t = Trigger::Signal(Signal::DisputeResolve(DisputeOutcome::Release));
        assert_eq!(t.dispute_outcome(), Some(DisputeOutcome::Release));
        assert_eq!(Trigger::Fund.dispute_outcome(), None);
    }
}
