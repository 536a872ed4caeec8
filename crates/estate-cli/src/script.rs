//! Scenario scripts: a JSON list of steps against named parties, assets
//! and deals.
//!
//! ```json
//! {
//!   "adjudicator": "judge",
//!   "steps": [
//!     { "op": "mint", "party": "bob", "amount": "100" },
//!     { "op": "register_asset", "asset": "villa", "owner": "alice" },
//!     { "op": "list_sale", "deal": "d1", "asset": "villa", "seller": "alice", "buyer": "bob", "price": "100" },
//!     { "op": "fund", "deal": "d1", "caller": "bob" },
//!     { "op": "confirm", "deal": "d1", "caller": "bob" }
//!   ]
//! }
//! ```

use std::{fmt, path::Path};

use estate_types::{DisputeOutcome, Result, SettlementError};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Name the adjudicator is known by in the script.
    #[serde(default = "default_adjudicator")]
    pub adjudicator: String,
    pub steps: Vec<Step>,
}

fn default_adjudicator() -> String {
    "adjudicator".to_owned()
}

impl Script {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint {
        party: String,
        amount: Decimal,
    },
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },
    RegisterAsset {
        asset: String,
        owner: String,
        #[serde(default)]
        metadata: String,
    },
    ListSale {
        deal: String,
        asset: String,
        seller: String,
        buyer: String,
        price: Decimal,
    },
    ListRental {
        deal: String,
        asset: String,
        landlord: String,
        tenant: String,
        period_amount: Decimal,
        periods: u32,
        #[serde(default)]
        period_length_secs: Option<u64>,
    },
    Fund {
        deal: String,
        caller: String,
    },
    PayPeriod {
        deal: String,
        caller: String,
    },
    Confirm {
        deal: String,
        caller: String,
    },
    Cancel {
        deal: String,
        caller: String,
    },
    PeriodElapsed {
        deal: String,
        caller: String,
    },
    TerminateEarly {
        deal: String,
        caller: String,
    },
    RaiseDispute {
        deal: String,
        caller: String,
    },
    ResolveDispute {
        deal: String,
        outcome: Outcome,
    },
    Advance {
        secs: u64,
    },
    CheckDeadlines,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint { party, amount } => write!(f, "mint {amount} to {party}"),
            Self::Transfer { from, to, amount } => write!(f, "transfer {amount} {from} -> {to}"),
            Self::RegisterAsset { asset, owner, .. } => write!(f, "register {asset} for {owner}"),
            Self::ListSale {
                deal, asset, price, ..
            } => write!(f, "list sale {deal} of {asset} at {price}"),
            Self::ListRental {
                deal,
                asset,
                period_amount,
                periods,
                ..
            } => write!(
                f,
                "list rental {deal} of {asset} at {period_amount} x {periods}"
            ),
            Self::Fund { deal, caller } => write!(f, "fund {deal} by {caller}"),
            Self::PayPeriod { deal, caller } => write!(f, "pay period {deal} by {caller}"),
            Self::Confirm { deal, caller } => write!(f, "confirm {deal} by {caller}"),
            Self::Cancel { deal, caller } => write!(f, "cancel {deal} by {caller}"),
            Self::PeriodElapsed { deal, caller } => write!(f, "period elapsed {deal} by {caller}"),
            Self::TerminateEarly { deal, caller } => write!(f, "terminate {deal} by {caller}"),
            Self::RaiseDispute { deal, caller } => write!(f, "dispute {deal} by {caller}"),
            Self::ResolveDispute { deal, outcome } => write!(f, "resolve {deal}: {outcome:?}"),
            Self::Advance { secs } => write!(f, "advance {secs}s"),
            Self::CheckDeadlines => write!(f, "check deadlines"),
        }
    }
}

/// Adjudicator verdict as written in scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Release,
    Refund,
}

impl From<Outcome> for DisputeOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Release => Self::Release,
            Outcome::Refund => Self::Refund,
        }
    }
}

/// Name lookup failure, reported as a rejected step.
pub fn unknown(kind: &str, name: &str) -> SettlementError {
    SettlementError::Configuration(format!("unknown {kind} `{name}`"))
}
