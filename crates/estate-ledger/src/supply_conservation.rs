//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced after every custody operation:
//! ```text
//! Σ(available + held) == Σ(minted) - Σ(burned)
//! ```
//!
//! Holds only move funds between a party's `available` and `held` columns,
//! and releases only move them between parties, so neither may change the
//! right-hand side. If the equality ever breaks, the ledger is corrupt.

use estate_types::{Result, SettlementError};
use rust_decimal::Decimal;

/// Tracks total issuance of the payment token.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    minted: Decimal,
    burned: Decimal,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// `InvalidAmount` if total issuance would leave the representable range.
    pub fn record_mint(&mut self, amount: Decimal) -> Result<()> {
        self.minted = self
            .minted
            .checked_add(amount)
            .ok_or(SettlementError::InvalidAmount { amount })?;
        Ok(())
    }

    pub fn record_burn(&mut self, amount: Decimal) {
        self.burned += amount;
    }

    /// Expected total supply: minted - burned.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.minted - self.burned
    }

    /// Verify that the actual supply (sum of all balances) matches issuance.
    ///
    /// # Errors
    /// Returns [`SettlementError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(SettlementError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.minted, self.burned
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_minted(&self) -> Decimal {
        self.minted
    }

    #[must_use]
    pub fn total_burned(&self) -> Decimal {
        self.burned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.expected_supply(), Decimal::ZERO);
        assert!(sc.verify(Decimal::ZERO).is_ok());
    }

    #[test]
    fn mint_and_burn_move_expected() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(Decimal::new(1000, 0)).unwrap();
        sc.record_mint(Decimal::new(500, 0)).unwrap();
        sc.record_burn(Decimal::new(300, 0));
        assert_eq!(sc.expected_supply(), Decimal::new(1200, 0));
        assert_eq!(sc.total_minted(), Decimal::new(1500, 0));
        assert_eq!(sc.total_burned(), Decimal::new(300, 0));
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(Decimal::new(10, 0)).unwrap();
        let err = sc.verify(Decimal::new(11, 0)).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::SupplyInvariantViolation { .. }
        ));
    }

    #[test]
    fn issuance_overflow_is_rejected() {
        let mut sc = SupplyConservation::new();
        sc.record_mint(Decimal::MAX).unwrap();
        let err = sc.record_mint(Decimal::ONE).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        assert_eq!(sc.total_minted(), Decimal::MAX);
    }
}
