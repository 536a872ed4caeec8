//! The escrow: custody and release engine shared by both venues.
//!
//! The escrow is the only component that moves held funds or touches an
//! asset's lock. It drives each deal through its state machine, performing
//! the custody side of every transition before the transition itself is
//! journaled, so a failed custody step leaves the deal where it was.
//!
//! Lock order: deal → reservations → asset → hold → parties. The deal map
//! is never held while a deal is locked.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use estate_ledger::{AssetRegistry, CustodyKey, PaymentLedger};
use estate_types::{
    AssetId, Clock, Deal, DealDescriptor, DealHold, DealId, DealKind, DealState, DisputeOutcome,
    EscrowConfig, PartyId, Result, SettlementError, Signal, Trigger, VenueId,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    custodian::DealCustodian,
    deadlines::{self, Deadline},
    rental,
};

type DealSlot = Arc<Mutex<Deal>>;

/// Central custody engine.
pub struct Escrow {
    config: EscrowConfig,
    ledger: Arc<PaymentLedger>,
    registry: Arc<AssetRegistry>,
    custody: CustodyKey,
    clock: Arc<dyn Clock>,
    deals: RwLock<HashMap<DealId, DealSlot>>,
    /// Asset → the open deal that has claimed it.
    reservations: Mutex<HashMap<AssetId, DealId>>,
}

impl Escrow {
    /// Bind an escrow to its ledger and registry.
    ///
    /// # Errors
    /// `Unauthorized` if the registry already issued its custody key to
    /// another escrow.
    pub fn new(
        config: EscrowConfig,
        ledger: Arc<PaymentLedger>,
        registry: Arc<AssetRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let custody = registry.issue_custody_key()?;
        info!(
            sale_venue = %config.sale_venue,
            rental_venue = %config.rental_venue,
            adjudicator = %config.adjudicator,
            "escrow configured"
        );
        Ok(Self {
            config,
            ledger,
            registry,
            custody,
            clock,
            deals: RwLock::new(HashMap::new()),
            reservations: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
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
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    /// Open a deal in `CREATED`.
    ///
    /// # Errors
    /// - `Unauthorized` if `venue` is not the venue configured for the deal's kind
    /// - `InvalidAmount` / `Configuration` for malformed terms
    /// - `AssetNotOwned` if the payee does not own the asset
    /// - `AssetLocked` if another open deal has claimed the asset
    pub fn register_deal(&self, venue: VenueId, descriptor: DealDescriptor) -> Result<DealId> {
        let expected = match descriptor.kind() {
            DealKind::Sale => self.config.sale_venue,
            DealKind::Rental => self.config.rental_venue,
        };
        if venue != expected {
            return Err(SettlementError::unauthorized(format!(
                "{venue} is not the configured {} venue",
                descriptor.kind()
            )));
        }
        descriptor.terms.validate()?;
        let total = descriptor.terms.total_amount()?;
        if descriptor.payer == descriptor.payee {
            return Err(SettlementError::unauthorized(
                "payer and payee must be different parties",
            ));
        }

        let asset_id = descriptor.asset_id;
        // A claim held by a deal whose funding window has passed is released
        // by evaluating that deal's deadlines first.
        let holder = self.reservations.lock().get(&asset_id).copied();
        if let Some(holder) = holder {
            self.check_deadlines(holder)?;
        }

        let mut reservations = self.reservations.lock();
        if reservations.contains_key(&asset_id) || self.registry.is_locked(asset_id)? {
            return Err(SettlementError::AssetLocked(asset_id));
        }
        if self.registry.owner_of(asset_id)? != descriptor.payee {
            return Err(SettlementError::AssetNotOwned {
                asset: asset_id,
                party: descriptor.payee,
            });
        }

        let deal = Deal::open(venue, descriptor, self.clock.now());
        let deal_id = deal.id;
        reservations.insert(asset_id, deal_id);
        self.deals.write().insert(deal_id, Arc::new(Mutex::new(deal)));
        drop(reservations);

        info!(
            %deal_id,
            %venue,
            %asset_id,
            kind = %descriptor.kind(),
            payer = %descriptor.payer,
            payee = %descriptor.payee,
            %total,
            "deal registered"
        );
        Ok(deal_id)
    }

    // ---------------------------------------------------------------
    // Custody operations
    // ---------------------------------------------------------------

    /// Hold the payer's first installment (the price, or period 0's rent)
    /// and lock the asset. `CREATED → FUNDED`.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the payer
    /// - `InvalidTransition` unless the deal is `CREATED`
    /// - `AssetNotOwned` if the payee gave the asset away since registration
    /// - `InsufficientBalance` if the payer cannot cover the installment
    pub fn fund(&self, deal_id: DealId, caller: PartyId) -> Result<()> {
        self.with_deal(deal_id, |deal, now| {
            deal.ensure_open()?;
            if caller != deal.payer {
                return Err(SettlementError::unauthorized(format!(
                    "{caller} is not the paying party"
                )));
            }
            ensure_edge(deal, DealState::Funded, Trigger::Fund)?;

            self.registry
                .lock(&self.custody, deal.asset_id, deal.id, deal.payee)?;
            let amount = deal.terms.installment();
            let hold_id = match self.ledger.hold(deal.payer, amount) {
                Ok(hold_id) => hold_id,
                Err(err) => {
                    self.registry.unlock(&self.custody, deal.asset_id, deal.id)?;
                    return Err(err);
                }
            };

            deal.holds.push(DealHold {
                hold_id,
                period: 0,
                amount,
            });
            deal.funded_at = Some(now);
            if let Some(progress) = deal.rental.as_mut() {
                progress.periods_paid = 1;
                progress.term_started_at = Some(now);
            }
            debug!(deal_id = %deal.id, %hold_id, %amount, "first installment held");
            self.transition(deal, DealState::Funded, Trigger::Fund, now)
        })
    }

    /// Hold the next rental period, then release every paid period that
    /// has fully elapsed to the landlord. Returns the period just paid.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the tenant
    /// - `InvalidTransition` for sales, unfunded or disputed rentals, or
    ///   when every period is already paid
    /// - `InsufficientBalance` if the tenant cannot cover the period
    pub fn pay_period(&self, deal_id: DealId, caller: PartyId) -> Result<u32> {
        self.with_deal(deal_id, |deal, now| {
            deal.ensure_open()?;
            if caller != deal.payer {
                return Err(SettlementError::unauthorized(format!(
                    "{caller} is not the tenant"
                )));
            }
            if deal.kind() != DealKind::Rental {
                return Err(SettlementError::invalid_transition(
                    deal.state,
                    "sale deals have no rental periods",
                ));
            }
            if deal.state != DealState::Funded {
                return Err(SettlementError::invalid_transition(
                    deal.state,
                    "periods after the first can only be paid on a funded rental",
                ));
            }
            let period = deal.rental.as_ref().map_or(0, |p| p.periods_paid);
            let periods = deal.terms.installments();
            if period >= periods {
                return Err(SettlementError::invalid_transition(
                    deal.state,
                    format!("all {periods} periods are already paid"),
                ));
            }

            let amount = deal.terms.installment();
            let hold_id = self.ledger.hold(deal.payer, amount)?;
            deal.holds.push(DealHold {
                hold_id,
                period,
                amount,
            });
            if let Some(progress) = deal.rental.as_mut() {
                progress.periods_paid += 1;
            }
            deal.record(Trigger::PayPeriod { period }, now);
            info!(deal_id = %deal.id, period, %hold_id, %amount, "rental period held");

            if self.settle_elapsed(deal, now)? > 0 {
                self.finish_term(deal, Trigger::TermComplete, now)?;
            }
            Ok(period)
        })
    }

    /// End a funded rental early: elapsed periods go to the landlord, the
    /// in-progress period is split per the proration policy, and prepaid
    /// future periods are refunded. `FUNDED → REFUNDED`.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the tenant or landlord
    /// - `InvalidTransition` for sales and for rentals not `FUNDED`
    pub fn terminate_early(&self, deal_id: DealId, caller: PartyId) -> Result<()> {
        self.with_deal(deal_id, |deal, now| {
            deal.ensure_open()?;
            if !deal.is_party(caller) {
                return Err(SettlementError::unauthorized(format!(
                    "{caller} is not a party to {}",
                    deal.id
                )));
            }
            if deal.kind() != DealKind::Rental || deal.state != DealState::Funded {
                return Err(SettlementError::invalid_transition(
                    deal.state,
                    "only a funded rental can be terminated early",
                ));
            }

            // Every share is priced before any hold moves, so a failure
            // leaves the rental untouched.
            let length = deal
                .period_length()
                .ok_or_else(|| SettlementError::Internal("rental without period length".into()))?;
            let proration = self.config.policy.proration;
            let mut unfinished = Vec::new();
            for hold in &deal.holds {
                if rental::is_elapsed(deal, hold.period, now) {
                    continue;
                }
                let start = rental::period_start(deal, hold.period).ok_or_else(|| {
                    SettlementError::Internal("funded rental without term start".into())
                })?;
                // A period starting exactly now has consumed nothing.
                let share = if start < now {
                    Some(rental::landlord_share(proration, hold.amount, start, length, now)?)
                } else {
                    None
                };
                unfinished.push((*hold, share));
            }

            self.settle_elapsed(deal, now)?;
            for (hold, share) in unfinished {
                match share {
                    Some(share) => {
                        self.ledger.settle(hold.hold_id, deal.payee, share)?;
                        deal.holds.retain(|h| h.hold_id != hold.hold_id);
                        if share > Decimal::ZERO {
                            if let Some(progress) = deal.rental.as_mut() {
                                progress.periods_settled += 1;
                            }
                            deal.record(
                                Trigger::PeriodSettled {
                                    period: hold.period,
                                },
                                now,
                            );
                        }
                        info!(
                            deal_id = %deal.id,
                            period = hold.period,
                            %share,
                            refunded = %(hold.amount - share),
                            "in-progress period prorated"
                        );
                    }
                    None => {
                        self.ledger.refund(hold.hold_id)?;
                        deal.holds.retain(|h| h.hold_id != hold.hold_id);
                        debug!(deal_id = %deal.id, period = hold.period, "prepaid period refunded");
                    }
                }
            }
            self.refund_remaining(deal, Trigger::TerminateEarly, now)
        })
    }

    /// Apply a party's or the adjudicator's signal. Returns the new state.
    ///
    /// # Errors
    /// - `DealClosed` once the deal is terminal
    /// - `Unauthorized` for callers outside the deal, or anyone but the
    ///   adjudicator resolving a dispute
    /// - `InvalidTransition` when the signal does not apply in the current state
    pub fn signal(&self, deal_id: DealId, caller: PartyId, signal: Signal) -> Result<DealState> {
        self.with_deal(deal_id, |deal, now| {
            deal.ensure_open()?;
            self.authorize(deal, caller, signal)?;
            let trigger = Trigger::Signal(signal);
            match signal {
                Signal::Acknowledge => {
                    if deal.kind() != DealKind::Sale || deal.state != DealState::Funded {
                        return Err(SettlementError::invalid_transition(
                            deal.state,
                            "acknowledgment applies to a funded sale",
                        ));
                    }
                    self.complete_sale(deal, trigger, now)?;
                }
                Signal::Cancel => self.cancel(deal, caller, trigger, now)?,
                Signal::PeriodElapsed => {
                    if deal.kind() != DealKind::Rental || deal.state != DealState::Funded {
                        return Err(SettlementError::invalid_transition(
                            deal.state,
                            "period-elapsed applies to a funded rental",
                        ));
                    }
                    if self.settle_elapsed(deal, now)? == 0 {
                        return Err(SettlementError::invalid_transition(
                            deal.state,
                            "no paid period has elapsed",
                        ));
                    }
                    self.finish_term(deal, trigger, now)?;
                }
                Signal::DisputeRaise => {
                    self.transition(deal, DealState::Disputed, trigger, now)?;
                    warn!(deal_id = %deal.id, %caller, "dispute raised");
                }
                Signal::DisputeResolve(outcome) => {
                    if deal.state != DealState::Disputed {
                        return Err(SettlementError::invalid_transition(
                            deal.state,
                            "only a disputed deal can be resolved",
                        ));
                    }
                    match (outcome, deal.kind()) {
                        (DisputeOutcome::Release, DealKind::Sale) => {
                            self.complete_sale(deal, trigger, now)?;
                        }
                        (DisputeOutcome::Release, DealKind::Rental) => {
                            self.release_remaining(deal, trigger, now)?;
                        }
                        (DisputeOutcome::Refund, _) => self.refund_remaining(deal, trigger, now)?,
                    }
                }
            }
            Ok(deal.state)
        })
    }

    /// Apply any deadline that has passed and, for a funded rental, settle
    /// every elapsed period. Returns the deal's state afterwards.
    pub fn check_deadlines(&self, deal_id: DealId) -> Result<DealState> {
        self.with_deal(deal_id, |deal, now| {
            if deal.kind() == DealKind::Rental
                && deal.state == DealState::Funded
                && self.settle_elapsed(deal, now)? > 0
            {
                self.finish_term(deal, Trigger::TermComplete, now)?;
            }
            Ok(deal.state)
        })
    }

    /// Run [`Escrow::check_deadlines`] over every open deal. Returns the
    /// deals whose state changed.
    pub fn check_all_deadlines(&self) -> Result<Vec<DealId>> {
        let slots: Vec<(DealId, DealSlot)> = self
            .deals
            .read()
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();
        let mut changed = Vec::new();
        for (deal_id, slot) in slots {
            let before = slot.lock().state;
            if before.is_terminal() {
                continue;
            }
            if self.check_deadlines(deal_id)? != before {
                changed.push(deal_id);
            }
        }
        changed.sort();
        Ok(changed)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Snapshot of a deal. Does not evaluate deadlines.
    pub fn deal(&self, deal_id: DealId) -> Result<Deal> {
        Ok(self.slot(deal_id)?.lock().clone())
    }

    /// Every deal `party` is payer or payee of, oldest first.
    #[must_use]
    pub fn deals_for(&self, party: PartyId) -> Vec<Deal> {
        let slots: Vec<DealSlot> = self.deals.read().values().cloned().collect();
        let mut deals: Vec<Deal> = slots
            .iter()
            .map(|slot| slot.lock())
            .filter(|deal| deal.is_party(party))
            .map(|deal| deal.clone())
            .collect();
        deals.sort_by_key(|deal| deal.id);
        deals
    }

    /// The open deal holding a claim on `asset_id`.
    #[must_use]
    pub fn open_deal_for(&self, asset_id: AssetId) -> Option<DealId> {
        self.reservations.lock().get(&asset_id).copied()
    }

    /// When the pending deadline on a deal fires, if it has one.
    pub fn next_deadline(&self, deal_id: DealId) -> Result<Option<(Deadline, DateTime<Utc>)>> {
        let slot = self.slot(deal_id)?;
        let deal = slot.lock();
        Ok(deadlines::next_deadline(&deal, &self.config.policy))
    }

    /// Re-verify a deal's journal hash chain.
    pub fn verify_journal(&self, deal_id: DealId) -> Result<bool> {
        let slot = self.slot(deal_id)?;
        let deal = slot.lock();
        Ok(deal.journal.verify(deal_id))
    }

    #[must_use]
    pub fn deal_count(&self) -> usize {
        self.deals.read().len()
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn slot(&self, deal_id: DealId) -> Result<DealSlot> {
        self.deals
            .read()
            .get(&deal_id)
            .cloned()
            .ok_or(SettlementError::DealNotFound(deal_id))
    }

    /// Lock one deal, apply any passed deadline, then run `op`. The asset
    /// claim is dropped once the deal is terminal, whether or not `op`
    /// succeeded.
    fn with_deal<R>(
        &self,
        deal_id: DealId,
        op: impl FnOnce(&mut Deal, DateTime<Utc>) -> Result<R>,
    ) -> Result<R> {
        let slot = self.slot(deal_id)?;
        let mut deal = slot.lock();
        let now = self.clock.now();
        let result = self
            .apply_deadline(&mut *deal, now)
            .and_then(|()| op(&mut *deal, now));
        if deal.state.is_terminal() {
            self.release_claim(deal.asset_id, deal.id);
        }
        if let Err(err) = &result {
            warn!(%deal_id, state = %deal.state, error = %err, "deal operation rejected");
        }
        result
    }

    fn apply_deadline(&self, deal: &mut Deal, now: DateTime<Utc>) -> Result<()> {
        let Some(deadline) = deadlines::due(deal, &self.config.policy, now) else {
            return Ok(());
        };
        warn!(deal_id = %deal.id, ?deadline, state = %deal.state, "deadline passed");
        match deadline {
            Deadline::Funding => self.refund_remaining(deal, deadline.trigger(), now),
            Deadline::Acknowledgment => {
                self.transition(deal, DealState::Disputed, deadline.trigger(), now)
            }
            Deadline::PaymentLapse => {
                self.settle_elapsed(deal, now)?;
                self.refund_remaining(deal, deadline.trigger(), now)
            }
        }
    }

    fn authorize(&self, deal: &Deal, caller: PartyId, signal: Signal) -> Result<()> {
        match signal {
            Signal::DisputeResolve(_) if caller != self.config.adjudicator => Err(
                SettlementError::unauthorized(format!("{caller} is not the adjudicator")),
            ),
            Signal::DisputeResolve(_) => Ok(()),
            Signal::Acknowledge if caller != deal.payer => Err(SettlementError::unauthorized(
                format!("only the buyer acknowledges delivery, not {caller}"),
            )),
            _ if !deal.is_party(caller) => Err(SettlementError::unauthorized(format!(
                "{caller} is not a party to {}",
                deal.id
            ))),
            _ => Ok(()),
        }
    }

    /// `CREATED` deals may be cancelled by either party. A funded sale may
    /// only be cancelled by the seller; the buyer has to dispute instead.
    fn cancel(
        &self,
        deal: &mut Deal,
        caller: PartyId,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match (deal.state, deal.kind()) {
            (DealState::Created, _) => self.refund_remaining(deal, trigger, now),
            (DealState::Funded, DealKind::Sale) if caller == deal.payee => {
                self.refund_remaining(deal, trigger, now)
            }
            (DealState::Funded, DealKind::Sale) => Err(SettlementError::unauthorized(
                "the buyer cannot cancel a funded sale; raise a dispute instead",
            )),
            (DealState::Funded, DealKind::Rental) => Err(SettlementError::invalid_transition(
                deal.state,
                "a funded rental ends through early termination",
            )),
            (state, _) => Err(SettlementError::invalid_transition(
                state,
                "cancellation is not possible here",
            )),
        }
    }

    /// Title to the buyer and the price to the seller, as one step.
    fn complete_sale(&self, deal: &mut Deal, trigger: Trigger, now: DateTime<Utc>) -> Result<()> {
        ensure_edge(deal, DealState::Completed, trigger)?;
        let hold = deal
            .holds
            .first()
            .copied()
            .ok_or_else(|| SettlementError::Internal(format!("{} has no held price", deal.id)))?;

        self.registry.transfer_locked(
            &self.custody,
            deal.asset_id,
            deal.id,
            deal.payee,
            deal.payer,
        )?;
        if let Err(err) = self.ledger.release(hold.hold_id, deal.payee) {
            self.registry
                .revert_transfer(&self.custody, deal.asset_id, deal.id, deal.payee)?;
            return Err(err);
        }
        deal.holds.clear();
        info!(
            deal_id = %deal.id,
            asset_id = %deal.asset_id,
            buyer = %deal.payer,
            seller = %deal.payee,
            price = %hold.amount,
            "sale settled"
        );
        self.transition(deal, DealState::Completed, trigger, now)
    }

    /// Release every held rental period whose end has passed, oldest
    /// first. Returns how many were released.
    fn settle_elapsed(&self, deal: &mut Deal, now: DateTime<Utc>) -> Result<u32> {
        let mut settled = 0;
        while let Some(hold) = deal.holds.first().copied() {
            if !rental::is_elapsed(deal, hold.period, now) {
                break;
            }
            self.release_period(deal, hold, now)?;
            settled += 1;
        }
        Ok(settled)
    }

    fn release_period(&self, deal: &mut Deal, hold: DealHold, now: DateTime<Utc>) -> Result<()> {
        self.ledger.release(hold.hold_id, deal.payee)?;
        deal.holds.remove(0);
        if let Some(progress) = deal.rental.as_mut() {
            progress.periods_settled += 1;
        }
        deal.record(
            Trigger::PeriodSettled {
                period: hold.period,
            },
            now,
        );
        info!(
            deal_id = %deal.id,
            period = hold.period,
            landlord = %deal.payee,
            amount = %hold.amount,
            "rental period settled"
        );
        Ok(())
    }

    /// Complete a rental once its final period has settled.
    fn finish_term(&self, deal: &mut Deal, trigger: Trigger, now: DateTime<Utc>) -> Result<()> {
        let periods = deal.terms.installments();
        let done = deal
            .rental
            .as_ref()
            .is_some_and(|progress| progress.periods_settled >= periods);
        if !done || deal.state != DealState::Funded {
            return Ok(());
        }
        self.registry
            .unlock(&self.custody, deal.asset_id, deal.id)?;
        self.transition(deal, DealState::Completed, trigger, now)
    }

    /// Adjudicated release of a rental: every held period to the landlord.
    fn release_remaining(
        &self,
        deal: &mut Deal,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        ensure_edge(deal, DealState::Completed, trigger)?;
        while let Some(hold) = deal.holds.first().copied() {
            self.release_period(deal, hold, now)?;
        }
        self.registry
            .unlock(&self.custody, deal.asset_id, deal.id)?;
        self.transition(deal, DealState::Completed, trigger, now)
    }

    /// Refund whatever is still held, unlock the asset, land in `REFUNDED`.
    fn refund_remaining(&self, deal: &mut Deal, trigger: Trigger, now: DateTime<Utc>) -> Result<()> {
        ensure_edge(deal, DealState::Refunded, trigger)?;
        let asset_locked = deal.state != DealState::Created;
        let mut refunded = Decimal::ZERO;
        while let Some(hold) = deal.holds.first().copied() {
            self.ledger.refund(hold.hold_id)?;
            deal.holds.remove(0);
            refunded += hold.amount;
        }
        if asset_locked {
            self.registry
                .unlock(&self.custody, deal.asset_id, deal.id)?;
        }
        info!(deal_id = %deal.id, payer = %deal.payer, %refunded, "held funds refunded");
        self.transition(deal, DealState::Refunded, trigger, now)
    }

    fn transition(
        &self,
        deal: &mut Deal,
        target: DealState,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let from = deal.state;
        deal.transition(target, trigger, now)?;
        info!(
            deal_id = %deal.id,
            kind = %deal.kind(),
            %from,
            to = %target,
            %trigger,
            journal_head = %deal.journal.head_hex(),
            "deal transition"
        );
        Ok(())
    }

    fn release_claim(&self, asset_id: AssetId, deal_id: DealId) {
        let mut reservations = self.reservations.lock();
        if reservations.get(&asset_id) == Some(&deal_id) {
            reservations.remove(&asset_id);
            debug!(%asset_id, %deal_id, "asset claim released");
        }
    }
}

fn ensure_edge(deal: &Deal, target: DealState, trigger: Trigger) -> Result<()> {
    if deal.state.can_transition_to(target) {
        return Ok(());
    }
    Err(SettlementError::invalid_transition(
        deal.state,
        format!("no edge to {target} on {trigger}"),
    ))
}

impl DealCustodian for Escrow {
    fn register_deal(&self, venue: VenueId, descriptor: DealDescriptor) -> Result<DealId> {
        Escrow::register_deal(self, venue, descriptor)
    }

    fn fund(&self, deal: DealId, caller: PartyId) -> Result<()> {
        Escrow::fund(self, deal, caller)
    }

    fn pay_period(&self, deal: DealId, caller: PartyId) -> Result<u32> {
        Escrow::pay_period(self, deal, caller)
    }

    fn terminate_early(&self, deal: DealId, caller: PartyId) -> Result<()> {
        Escrow::terminate_early(self, deal, caller)
    }

    fn signal(&self, deal: DealId, caller: PartyId, signal: Signal) -> Result<DealState> {
        Escrow::signal(self, deal, caller, signal)
    }

    fn check_deadlines(&self, deal: DealId) -> Result<DealState> {
        Escrow::check_deadlines(self, deal)
    }

    fn deal(&self, deal: DealId) -> Result<Deal> {
        Escrow::deal(self, deal)
    }
}
