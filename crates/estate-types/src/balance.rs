//! A party's payment-token position.
//!
//! Tokens a party can spend or transfer sit in `available`. Tokens backing a
//! deal (a sale price, or one rental period) sit in `held` until the escrow
//! releases them to the payee or refunds them. The ledger only changes an
//! entry through the methods below, each of which leaves the entry untouched
//! on error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SettlementError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Spendable through ordinary transfers and new holds.
    pub available: Decimal,
    /// Backing open deal holds.
    pub held: Decimal,
}

impl BalanceEntry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `available + held`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.held
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.held.is_zero()
    }

    /// Add to `available`.
    ///
    /// # Errors
    /// `InvalidAmount` if the balance would exceed the representable range.
    pub fn credit(&mut self, amount: Decimal) -> Result<()> {
        self.available = self
            .available
            .checked_add(amount)
            .ok_or(SettlementError::InvalidAmount { amount })?;
        Ok(())
    }

    /// Take from `available`.
    ///
    /// # Errors
    /// `InsufficientBalance` if less than `amount` is available.
    pub fn debit(&mut self, amount: Decimal) -> Result<()> {
        if self.available < amount {
            return Err(SettlementError::InsufficientBalance {
                needed: amount,
                available: self.available,
            });
        }
        self.available -= amount;
        Ok(())
    }

    /// Move `amount` from `available` into `held` to back a deal.
    ///
    /// # Errors
    /// `InsufficientBalance` if less than `amount` is available.
    pub fn hold(&mut self, amount: Decimal) -> Result<()> {
        self.debit(amount)?;
        self.held += amount;
        Ok(())
    }

    /// Drop `amount` from `held` when a hold closes. The caller credits the
    /// released funds wherever they go.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` if `held` is smaller than the hold, which
    /// means the ledger lost track of a hold.
    pub fn take_held(&mut self, amount: Decimal) -> Result<()> {
        if self.held < amount {
            return Err(SettlementError::SupplyInvariantViolation {
                reason: format!("held balance {} below hold amount {amount}", self.held),
            });
        }
        self.held -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn hold_moves_rent_out_of_spendable() {
        let mut entry = BalanceEntry::new();
        entry.credit(dec(30)).unwrap();
        entry.hold(dec(10)).unwrap();
        assert_eq!(entry.available, dec(20));
        assert_eq!(entry.held, dec(10));
        assert_eq!(entry.total(), dec(30));

        let err = entry.hold(dec(21)).unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientBalance { .. }));
        assert_eq!(entry.available, dec(20));
    }

    #[test]
    fn closing_more_than_held_is_an_invariant_breach() {
        let mut entry = BalanceEntry::new();
        entry.credit(dec(5)).unwrap();
        entry.hold(dec(5)).unwrap();
        let err = entry.take_held(dec(6)).unwrap_err();
        assert!(matches!(err, SettlementError::SupplyInvariantViolation { .. }));
        entry.take_held(dec(5)).unwrap();
        assert_eq!(entry.available, Decimal::ZERO);
        assert!(entry.is_zero());
    }

    #[test]
    fn credit_past_max_is_rejected_unchanged() {
        let mut entry = BalanceEntry::new();
        entry.credit(Decimal::MAX).unwrap();
        let err = entry.credit(Decimal::ONE).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        assert_eq!(entry.available, Decimal::MAX);
    }

    #[test]
    fn amounts_serialize_as_strings() {
        let mut entry = BalanceEntry::new();
        entry.credit(Decimal::new(1_505, 1)).unwrap();
        entry.hold(dec(100)).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["available"], "50.5");
        assert_eq!(json["held"], "100");
        let back: BalanceEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
