//! # Hold: the single-use custody primitive
//!
//! A `Hold` is a frozen allocation of one party's payment-token balance,
//! created atomically when the ledger moves funds from `available` to `held`.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  release / settle  ┌──────────┐
//!   │ ACTIVE ├───────────────────▶│ RELEASED │
//!   └───┬────┘                    └──────────┘
//!       │ refund
//!       ▼
//!   ┌──────────┐
//!   │ REFUNDED │
//!   └──────────┘
//! ```
//!
//! Exactly one closing transition ever succeeds per hold. A second attempt
//! surfaces as [`SettlementError::UnknownHold`](crate::SettlementError::UnknownHold).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{HoldId, PartyId, Result, SettlementError};

/// The lifecycle state of a hold. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldState {
    /// Funds are frozen and may still be released or refunded.
    Active,
    /// Funds went to a recipient (possibly with a refunded remainder).
    Released,
    /// Funds went back to the depositor in full.
    Refunded,
}

impl HoldState {
    /// Can this hold transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Released | Self::Refunded))
    }
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// A frozen allocation of funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    /// The party whose balance was frozen.
    pub depositor: PartyId,
    pub amount: Decimal,
    pub state: HoldState,
    /// Recipient of a release, once closed that way.
    pub recipient: Option<PartyId>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Hold {
    /// A fresh active hold.
    #[must_use]
    pub fn new(depositor: PartyId, amount: Decimal) -> Self {
        Self {
            id: HoldId::new(),
            depositor,
            amount,
            state: HoldState::Active,
            recipient: None,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == HoldState::Active
    }

    /// Close the hold as released to `recipient`.
    pub fn mark_released(&mut self, recipient: PartyId) -> Result<()> {
        self.close(HoldState::Released)?;
        self.recipient = Some(recipient);
        Ok(())
    }

    /// Close the hold as refunded to the depositor.
    pub fn mark_refunded(&mut self) -> Result<()> {
        self.close(HoldState::Refunded)
    }

    fn close(&mut self, target: HoldState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(SettlementError::UnknownHold(self.id));
        }
        self.state = target;
        self.closed_at = Some(Utc::now());
        Ok(())
    }
}
