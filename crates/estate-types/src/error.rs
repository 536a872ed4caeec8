//! Error types for the settlement core.
//!
//! All errors use the `ES_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Asset registry errors
//! - 2xx: Payment ledger errors
//! - 3xx: Deal / state machine errors
//! - 4xx: Configuration errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AssetId, DealId, DealState, HoldId, PartyId};

/// Central error enum for all settlement operations.
#[derive(Debug, Error)]
pub enum SettlementError {
    // =================================================================
    // Asset Registry Errors (1xx)
    // =================================================================
    /// No asset with this ID is registered.
    #[error("ES_ERR_100: Asset not found: {0}")]
    AssetNotFound(AssetId),

    /// The `from` party of a transfer is not the current owner.
    #[error("ES_ERR_101: {party} is not the owner of {asset}")]
    NotOwner { asset: AssetId, party: PartyId },

    /// The asset is locked by an active deal and cannot change hands.
    #[error("ES_ERR_102: Asset not transferable: {0}")]
    NotTransferable(AssetId),

    /// A venue pre-flight check found the listing party does not own the asset.
    #[error("ES_ERR_103: Asset {asset} is not owned by {party}")]
    AssetNotOwned { asset: AssetId, party: PartyId },

    /// The asset is already under an active deal.
    #[error("ES_ERR_104: Asset locked by an active deal: {0}")]
    AssetLocked(AssetId),

    // =================================================================
    // Payment Ledger Errors (2xx)
    // =================================================================
    /// Not enough spendable balance to perform the operation.
    #[error("ES_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// The hold does not exist or was already released/refunded.
    #[error("ES_ERR_201: Unknown hold: {0}")]
    UnknownHold(HoldId),

    /// Amounts must be strictly positive.
    #[error("ES_ERR_202: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Supply conservation invariant violated, a critical safety alert.
    #[error("ES_ERR_203: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Deal / State Machine Errors (3xx)
    // =================================================================
    /// No deal with this ID is tracked by the escrow.
    #[error("ES_ERR_300: Deal not found: {0}")]
    DealNotFound(DealId),

    /// The caller is not allowed to perform this action.
    #[error("ES_ERR_301: Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// A state machine guard rejected the transition.
    #[error("ES_ERR_302: Invalid transition from {state}: {reason}")]
    InvalidTransition { state: DealState, reason: String },

    /// The deal already reached a terminal state.
    #[error("ES_ERR_303: Deal {deal} is closed ({state})")]
    DealClosed { deal: DealId, state: DealState },

    // =================================================================
    // Configuration Errors (4xx)
    // =================================================================
    /// Venue/escrow wiring is missing a required piece.
    #[error("ES_ERR_400: Configuration incomplete: missing {missing}")]
    ConfigurationIncomplete { missing: &'static str },

    /// Configuration file could not be parsed or failed validation.
    #[error("ES_ERR_401: Configuration error: {0}")]
    Configuration(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ES_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("ES_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("ES_ERR_902: I/O error: {0}")]
    Io(String),
}

impl SettlementError {
    /// Shorthand for an [`SettlementError::Unauthorized`] error.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`SettlementError::InvalidTransition`] error.
    pub fn invalid_transition(state: DealState, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            state,
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SettlementError>;

impl From<std::io::Error> for SettlementError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
