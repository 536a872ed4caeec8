//! Payment-token ledger with single-use holds.
//!
//! Tracks per-party balances with available/held accounting. A hold moves
//! funds from `available` to `held` and can be closed exactly once: released
//! to a recipient (optionally with a refunded remainder) or refunded to the
//! depositor. All mutations are atomic: either the full operation succeeds
//! or every balance is unchanged.

use std::{collections::HashMap, sync::Arc};

use estate_types::{BalanceEntry, Hold, HoldId, PartyId, Result, SettlementError};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::supply_conservation::SupplyConservation;

type Account = Arc<Mutex<BalanceEntry>>;

/// Source of truth for payment-token balances and holds.
///
/// Each party's entry and each hold has its own lock, so operations on
/// disjoint parties never contend. Lock order: supply → hold → parties
/// (ascending id).
pub struct PaymentLedger {
    accounts: RwLock<HashMap<PartyId, Account>>,
    holds: RwLock<HashMap<HoldId, Arc<Mutex<Hold>>>>,
    supply: Mutex<SupplyConservation>,
}

impl PaymentLedger {
    /// Create an empty ledger with zero supply.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            holds: RwLock::new(HashMap::new()),
            supply: Mutex::new(SupplyConservation::new()),
        }
    }

    // ---------------------------------------------------------------
    // Issuance
    // ---------------------------------------------------------------

    /// Issue new tokens to `party`. The only way supply grows.
    ///
    /// # Errors
    /// `InvalidAmount` if the balance or total issuance would leave the
    /// representable range. Nothing changes in that case.
    pub fn mint(&self, party: PartyId, amount: Decimal) -> Result<()> {
        ensure_positive(amount)?;
        let mut supply = self.supply.lock();
        let account = self.account(party);
        let mut entry = account.lock();
        let mut credited = entry.clone();
        credited.credit(amount)?;
        supply.record_mint(amount)?;
        *entry = credited;
        drop(entry);
        info!(%party, %amount, "payment token minted");
        Ok(())
    }

    /// Destroy tokens from `party`'s available balance.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn burn(&self, party: PartyId, amount: Decimal) -> Result<()> {
        ensure_positive(amount)?;
        let mut supply = self.supply.lock();
        let account = self.account(party);
        account.lock().debit(amount)?;
        supply.record_burn(amount);
        info!(%party, %amount, "payment token burned");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Spendable balance
    // ---------------------------------------------------------------

    /// Move spendable funds between parties.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` has less than `amount` available.
    pub fn transfer(&self, from: PartyId, to: PartyId, amount: Decimal) -> Result<()> {
        ensure_positive(amount)?;
        self.with_pair(from, to, |src, dst| {
            let Some(dst) = dst else {
                // Self-transfer: only the balance check applies.
                return src.clone().debit(amount);
            };
            src.debit(amount)?;
            dst.credit(amount)
        })?;
        debug!(%from, %to, %amount, "transfer");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Holds
    // ---------------------------------------------------------------

    /// Freeze `amount` of `party`'s available balance.
    ///
    /// If the freeze fails, no hold is created.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn hold(&self, party: PartyId, amount: Decimal) -> Result<HoldId> {
        ensure_positive(amount)?;
        let account = self.account(party);
        let mut entry = account.lock();
        entry.hold(amount)?;

        let hold = Hold::new(party, amount);
        let hold_id = hold.id;
        self.holds.write().insert(hold_id, Arc::new(Mutex::new(hold)));
        drop(entry);

        debug!(%hold_id, %party, %amount, "hold created");
        Ok(hold_id)
    }

    /// Release the whole hold to `to`.
    ///
    /// # Errors
    /// Returns `UnknownHold` if the hold doesn't exist or is already closed.
    pub fn release(&self, hold_id: HoldId, to: PartyId) -> Result<()> {
        self.close_hold(hold_id, Some((to, None)))
    }

    /// Release `amount` of the hold to `to` and refund the remainder to the
    /// depositor, as one closing operation.
    ///
    /// # Errors
    /// - `UnknownHold` if the hold doesn't exist or is already closed
    /// - `InvalidAmount` if `amount` is negative or exceeds the hold
    pub fn settle(&self, hold_id: HoldId, to: PartyId, amount: Decimal) -> Result<()> {
        if amount.is_zero() {
            return self.refund(hold_id);
        }
        self.close_hold(hold_id, Some((to, Some(amount))))
    }

    /// Return the whole hold to its depositor.
    ///
    /// # Errors
    /// Returns `UnknownHold` if the hold doesn't exist or is already closed.
    pub fn refund(&self, hold_id: HoldId) -> Result<()> {
        self.close_hold(hold_id, None)
    }

    fn close_hold(&self, hold_id: HoldId, payout: Option<(PartyId, Option<Decimal>)>) -> Result<()> {
        let slot = self
            .holds
            .read()
            .get(&hold_id)
            .cloned()
            .ok_or(SettlementError::UnknownHold(hold_id))?;
        let mut hold = slot.lock();
        if !hold.is_active() {
            return Err(SettlementError::UnknownHold(hold_id));
        }
        let depositor = hold.depositor;
        let amount = hold.amount;

        match payout {
            None => {
                let account = self.account(depositor);
                let mut entry = account.lock();
                entry.take_held(amount)?;
                entry.credit(amount)?;
                drop(entry);
                hold.mark_refunded()?;
                debug!(%hold_id, %depositor, %amount, "hold refunded");
            }
            Some((to, paid)) => {
                let paid = paid.unwrap_or(amount);
                if paid < Decimal::ZERO || paid > amount {
                    return Err(SettlementError::InvalidAmount { amount: paid });
                }
                self.with_pair(depositor, to, |src, dst| {
                    src.take_held(amount)?;
                    src.credit(amount - paid)?;
                    match dst {
                        Some(dst) => dst.credit(paid),
                        None => src.credit(paid),
                    }
                })?;
                hold.mark_released(to)?;
                debug!(%hold_id, %depositor, %to, %paid, remainder = %(amount - paid), "hold released");
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Balance entry for a party (zero if unknown).
    #[must_use]
    pub fn balance(&self, party: PartyId) -> BalanceEntry {
        let account = self.accounts.read().get(&party).cloned();
        account.map(|a| a.lock().clone()).unwrap_or_default()
    }

    /// Spendable balance of a party.
    #[must_use]
    pub fn balance_of(&self, party: PartyId) -> Decimal {
        self.balance(party).available
    }

    /// Snapshot of a hold.
    #[must_use]
    pub fn get_hold(&self, hold_id: HoldId) -> Option<Hold> {
        let slot = self.holds.read().get(&hold_id).cloned();
        slot.map(|s| s.lock().clone())
    }

    #[must_use]
    pub fn is_active(&self, hold_id: HoldId) -> bool {
        self.get_hold(hold_id).is_some_and(|h| h.is_active())
    }

    /// Sum of every still-active hold.
    #[must_use]
    pub fn active_hold_total(&self) -> Decimal {
        let slots: Vec<_> = self.holds.read().values().cloned().collect();
        slots
            .iter()
            .map(|slot| slot.lock())
            .filter(|h| h.is_active())
            .map(|h| h.amount)
            .sum()
    }

    /// Sum of all balances (available + held), from a consistent snapshot.
    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.snapshot().iter().map(|(_, entry)| entry.total()).sum()
    }

    /// Expected supply according to issuance records.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.supply.lock().expected_supply()
    }

    /// Verify supply conservation and the no-negative-balance invariant.
    ///
    /// # Errors
    /// Returns [`SettlementError::SupplyInvariantViolation`] if either breaks.
    pub fn verify_supply(&self) -> Result<()> {
        let supply = self.supply.lock();
        let snapshot = self.snapshot();
        if let Some((party, entry)) = snapshot
            .iter()
            .find(|(_, e)| e.available < Decimal::ZERO || e.held < Decimal::ZERO)
        {
            return Err(SettlementError::SupplyInvariantViolation {
                reason: format!("negative balance for {party}: {entry:?}"),
            });
        }
        let actual: Decimal = snapshot.iter().map(|(_, entry)| entry.total()).sum();
        supply.verify(actual)
    }

    /// Number of parties with a balance entry.
    #[must_use]
    pub fn party_count(&self) -> usize {
        self.accounts.read().len()
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn account(&self, party: PartyId) -> Account {
        if let Some(account) = self.accounts.read().get(&party) {
            return Arc::clone(account);
        }
        Arc::clone(self.accounts.write().entry(party).or_default())
    }

    /// Run `f` with both parties locked in ascending id order. When `a == b`
    /// the second entry is `None`.
    fn with_pair<R>(
        &self,
        a: PartyId,
        b: PartyId,
        f: impl FnOnce(&mut BalanceEntry, Option<&mut BalanceEntry>) -> Result<R>,
    ) -> Result<R> {
        let first = self.account(a);
        if a == b {
            let mut entry = first.lock();
            return f(&mut *entry, None);
        }
        let second = self.account(b);
        if a < b {
            let mut ga = first.lock();
            let mut gb = second.lock();
            f(&mut *ga, Some(&mut *gb))
        } else {
            let mut gb = second.lock();
            let mut ga = first.lock();
            f(&mut *ga, Some(&mut *gb))
        }
    }

    /// All entries, locked together in id order and cloned out.
    fn snapshot(&self) -> Vec<(PartyId, BalanceEntry)> {
        let mut accounts: Vec<(PartyId, Account)> = self
            .accounts
            .read()
            .iter()
            .map(|(party, account)| (*party, Arc::clone(account)))
            .collect();
        accounts.sort_by_key(|(party, _)| *party);
        let guards: Vec<_> = accounts
            .iter()
            .map(|(party, account)| (*party, account.lock()))
            .collect();
        guards
            .iter()
            .map(|(party, entry)| (*party, (**entry).clone()))
            .collect()
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(SettlementError::InvalidAmount { amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_types::HoldState;
    use rand::Rng;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn funded(amount: i64) -> (PaymentLedger, PartyId) {
        let ledger = PaymentLedger::new();
        let party = PartyId::new();
        ledger.mint(party, dec(amount)).unwrap();
        (ledger, party)
    }

    #[test]
    fn mint_increases_available_and_supply() {
        let (ledger, party) = funded(1000);
        let bal = ledger.balance(party);
        assert_eq!(bal.available, dec(1000));
        assert_eq!(bal.held, Decimal::ZERO);
        assert_eq!(ledger.expected_supply(), dec(1000));
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn mint_rejects_non_positive() {
        let ledger = PaymentLedger::new();
        let err = ledger.mint(PartyId::new(), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        let err = ledger.mint(PartyId::new(), dec(-5)).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
    }

    #[test]
    fn mint_past_max_is_rejected_unchanged() {
        let (ledger, whale) = funded(1);
        let err = ledger.mint(whale, Decimal::MAX).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        assert_eq!(ledger.balance_of(whale), dec(1));

        // Issuance is bounded even when spread across parties.
        let other = PartyId::new();
        let err = ledger.mint(other, Decimal::MAX).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        assert_eq!(ledger.balance_of(other), Decimal::ZERO);
        assert_eq!(ledger.expected_supply(), dec(1));
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn burn_reduces_supply() {
        let (ledger, party) = funded(100);
        ledger.burn(party, dec(40)).unwrap();
        assert_eq!(ledger.balance_of(party), dec(60));
        assert_eq!(ledger.expected_supply(), dec(60));
        ledger.verify_supply().unwrap();
        assert!(ledger.burn(party, dec(61)).is_err());
    }

    #[test]
    fn transfer_moves_available() {
        let (ledger, alice) = funded(100);
        let bob = PartyId::new();
        ledger.transfer(alice, bob, dec(30)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(70));
        assert_eq!(ledger.balance_of(bob), dec(30));
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn transfer_insufficient_fails_unchanged() {
        let (ledger, alice) = funded(100);
        let bob = PartyId::new();
        let err = ledger.transfer(alice, bob, dec(101)).unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(alice), dec(100));
        assert_eq!(ledger.balance_of(bob), Decimal::ZERO);
    }

    #[test]
    fn transfer_to_self_is_noop() {
        let (ledger, alice) = funded(100);
        ledger.transfer(alice, alice, dec(50)).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(100));
    }

    #[test]
    fn held_funds_are_not_spendable() {
        let (ledger, alice) = funded(100);
        ledger.hold(alice, dec(80)).unwrap();
        let err = ledger.transfer(alice, PartyId::new(), dec(30)).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InsufficientBalance { available, .. } if available == dec(20)
        ));
    }

    #[test]
    fn hold_moves_to_held() {
        let (ledger, alice) = funded(100);
        let hold_id = ledger.hold(alice, dec(40)).unwrap();
        let bal = ledger.balance(alice);
        assert_eq!(bal.available, dec(60));
        assert_eq!(bal.held, dec(40));
        assert!(ledger.is_active(hold_id));
        assert_eq!(ledger.active_hold_total(), dec(40));
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn hold_insufficient_creates_nothing() {
        let (ledger, alice) = funded(10);
        let err = ledger.hold(alice, dec(11)).unwrap_err();
        assert!(matches!(err, SettlementError::InsufficientBalance { .. }));
        assert_eq!(ledger.active_hold_total(), Decimal::ZERO);
        assert_eq!(ledger.balance_of(alice), dec(10));
    }

    #[test]
    fn release_pays_recipient() {
        let (ledger, alice) = funded(100);
        let bob = PartyId::new();
        let hold_id = ledger.hold(alice, dec(100)).unwrap();
        ledger.release(hold_id, bob).unwrap();
        assert_eq!(ledger.balance(alice), BalanceEntry::new());
        assert_eq!(ledger.balance_of(bob), dec(100));
        let hold = ledger.get_hold(hold_id).unwrap();
        assert_eq!(hold.state, HoldState::Released);
        assert_eq!(hold.recipient, Some(bob));
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn refund_returns_to_depositor() {
        let (ledger, alice) = funded(100);
        let hold_id = ledger.hold(alice, dec(60)).unwrap();
        ledger.refund(hold_id).unwrap();
        assert_eq!(ledger.balance_of(alice), dec(100));
        assert_eq!(ledger.balance(alice).held, Decimal::ZERO);
        assert_eq!(ledger.get_hold(hold_id).unwrap().state, HoldState::Refunded);
    }

    #[test]
    fn hold_closes_at_most_once() {
        let (ledger, alice) = funded(100);
        let bob = PartyId::new();
        let hold_id = ledger.hold(alice, dec(50)).unwrap();
        ledger.release(hold_id, bob).unwrap();

        let err = ledger.release(hold_id, bob).unwrap_err();
        assert!(matches!(err, SettlementError::UnknownHold(id) if id == hold_id));
        let err = ledger.refund(hold_id).unwrap_err();
        assert!(matches!(err, SettlementError::UnknownHold(_)));
        assert_eq!(ledger.balance_of(bob), dec(50));
    }

    #[test]
    fn unknown_hold_errors() {
        let ledger = PaymentLedger::new();
        let err = ledger.refund(HoldId::new()).unwrap_err();
        assert!(matches!(err, SettlementError::UnknownHold(_)));
    }

    #[test]
    fn settle_splits_hold() {
        let (ledger, tenant) = funded(100);
        let landlord = PartyId::new();
        let hold_id = ledger.hold(tenant, dec(10)).unwrap();
        ledger.settle(hold_id, landlord, dec(4)).unwrap();
        assert_eq!(ledger.balance_of(landlord), dec(4));
        assert_eq!(ledger.balance_of(tenant), dec(96));
        assert_eq!(ledger.balance(tenant).held, Decimal::ZERO);
        ledger.verify_supply().unwrap();
    }

    #[test]
    fn settle_rejects_overpayment() {
        let (ledger, tenant) = funded(100);
        let hold_id = ledger.hold(tenant, dec(10)).unwrap();
        let err = ledger.settle(hold_id, PartyId::new(), dec(11)).unwrap_err();
        assert!(matches!(err, SettlementError::InvalidAmount { .. }));
        assert!(ledger.is_active(hold_id));
    }

    #[test]
    fn settle_zero_is_refund() {
        let (ledger, tenant) = funded(100);
        let hold_id = ledger.hold(tenant, dec(10)).unwrap();
        ledger.settle(hold_id, PartyId::new(), Decimal::ZERO).unwrap();
        assert_eq!(ledger.get_hold(hold_id).unwrap().state, HoldState::Refunded);
        assert_eq!(ledger.balance_of(tenant), dec(100));
    }

    #[test]
    fn nonexistent_balance_is_zero() {
        let ledger = PaymentLedger::new();
        assert!(ledger.balance(PartyId::new()).is_zero());
        assert_eq!(ledger.party_count(), 0);
    }

    #[test]
    fn random_operations_conserve_supply() {
        let ledger = PaymentLedger::new();
        let parties: Vec<PartyId> = (0..6).map(|_| PartyId::new()).collect();
        for p in &parties {
            ledger.mint(*p, dec(1_000)).unwrap();
        }
        let mut rng = rand::thread_rng();
        let mut open: Vec<HoldId> = Vec::new();
        for _ in 0..500 {
            let a = parties[rng.gen_range(0..parties.len())];
            let b = parties[rng.gen_range(0..parties.len())];
            let amount = dec(rng.gen_range(1..200));
            match rng.gen_range(0..4) {
                0 => {
                    let _ = ledger.transfer(a, b, amount);
                }
                1 => {
                    if let Ok(id) = ledger.hold(a, amount) {
                        open.push(id);
                    }
                }
                2 if !open.is_empty() => {
                    let id = open.swap_remove(rng.gen_range(0..open.len()));
                    ledger.release(id, b).unwrap();
                }
                _ if !open.is_empty() => {
                    let id = open.swap_remove(rng.gen_range(0..open.len()));
                    ledger.refund(id).unwrap();
                }
                _ => {}
            }
            ledger.verify_supply().unwrap();
        }
        assert_eq!(ledger.total_supply(), dec(6_000));
    }

    #[test]
    fn concurrent_transfers_conserve_supply() {
        let ledger = PaymentLedger::new();
        let parties: Vec<PartyId> = (0..4).map(|_| PartyId::new()).collect();
        for p in &parties {
            ledger.mint(*p, dec(500)).unwrap();
        }
        std::thread::scope(|s| {
            for i in 0..4 {
                let ledger = &ledger;
                let parties = &parties;
                s.spawn(move || {
                    for n in 0..200 {
                        let from = parties[(i + n) % 4];
                        let to = parties[(i + n + 1) % 4];
                        let _ = ledger.transfer(from, to, dec(7));
                        if let Ok(id) = ledger.hold(from, dec(3)) {
                            ledger.release(id, to).unwrap();
                        }
                    }
                });
            }
        });
        ledger.verify_supply().unwrap();
        assert_eq!(ledger.total_supply(), dec(2_000));
        assert_eq!(ledger.active_hold_total(), Decimal::ZERO);
    }
}
