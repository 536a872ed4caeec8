//! Applies a [`Script`] to a fresh topology on a manual clock.
//!
//! A step that the settlement core rejects is reported and the replay goes
//! on; scripts are expected to exercise failure paths.

use std::{collections::BTreeMap, sync::Arc};

use estate_types::{
    AssetId, DealId, DealKind, DealState, ManualClock, PartyId, Result, SettlementConfig,
};
use estate_venues::SettlementTopology;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::script::{unknown, Script, Step};

/// Result of one step.
#[derive(Debug)]
pub struct StepOutcome {
    pub index: usize,
    pub label: String,
    pub result: Result<String>,
}

/// End-of-replay view of every named party, asset and deal.
#[derive(Debug, Serialize)]
pub struct Report {
    pub balances: BTreeMap<String, PartyBalance>,
    pub assets: BTreeMap<String, AssetView>,
    pub deals: BTreeMap<String, DealView>,
    pub total_supply: Decimal,
    pub supply_conserved: bool,
}

#[derive(Debug, Serialize)]
pub struct PartyBalance {
    pub available: Decimal,
    pub held: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AssetView {
    pub owner: String,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct DealView {
    pub kind: DealKind,
    pub state: DealState,
    pub held: Decimal,
    pub journal_entries: usize,
    pub journal_head: String,
    pub journal_verified: bool,
}

pub struct Replayer {
    topology: SettlementTopology,
    clock: Arc<ManualClock>,
    adjudicator: PartyId,
    parties: BTreeMap<String, PartyId>,
    assets: BTreeMap<String, AssetId>,
    deals: BTreeMap<String, DealId>,
}

impl Replayer {
    pub fn new(config: &SettlementConfig, adjudicator_name: &str) -> Result<Self> {
        let clock = Arc::new(ManualClock::default());
        let adjudicator = PartyId::new();
        let topology = SettlementTopology::assemble_with_clock(config, adjudicator, clock.clone())?;
        let mut parties = BTreeMap::new();
        parties.insert(adjudicator_name.to_owned(), adjudicator);
        Ok(Self {
            topology,
            clock,
            adjudicator,
            parties,
            assets: BTreeMap::new(),
            deals: BTreeMap::new(),
        })
    }

    /// Apply every step in order.
    pub fn run(&mut self, script: &Script) -> Vec<StepOutcome> {
        script
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = self.apply(step);
                debug!(index, step = %step, ok = result.is_ok(), "step applied");
                StepOutcome {
                    index,
                    label: step.to_string(),
                    result,
                }
            })
            .collect()
    }

    /// Apply one step, describing what happened.
    pub fn apply(&mut self, step: &Step) -> Result<String> {
        match step {
            Step::Mint { party, amount } => {
                let party = self.party(party);
                self.topology.ledger().mint(party, *amount)?;
                Ok(format!("balance {}", self.topology.ledger().balance_of(party)))
            }
            Step::Transfer { from, to, amount } => {
                let (from, to) = (self.party(from), self.party(to));
                self.topology.ledger().transfer(from, to, *amount)?;
                Ok("ok".to_owned())
            }
            Step::RegisterAsset {
                asset,
                owner,
                metadata,
            } => {
                let owner = self.party(owner);
                let id = self.topology.registry().register_asset(owner, metadata.as_str());
                self.assets.insert(asset.clone(), id);
                Ok(id.to_string())
            }
            Step::ListSale {
                deal,
                asset,
                seller,
                buyer,
                price,
            } => {
                let asset = self.asset(asset)?;
                let (seller, buyer) = (self.party(seller), self.party(buyer));
                let id = self
                    .topology
                    .sale()
                    .create_sale_deal(seller, asset, buyer, *price)?;
                self.deals.insert(deal.clone(), id);
                Ok(id.to_string())
            }
            Step::ListRental {
                deal,
                asset,
                landlord,
                tenant,
                period_amount,
                periods,
                period_length_secs,
            } => {
                let asset = self.asset(asset)?;
                let (landlord, tenant) = (self.party(landlord), self.party(tenant));
                let rental = self.topology.rental();
                let length = period_length_secs.unwrap_or(rental.defaults().period_length_secs);
                let id = rental.create_rental_deal_with_period(
                    landlord,
                    asset,
                    tenant,
                    *period_amount,
                    *periods,
                    length,
                )?;
                self.deals.insert(deal.clone(), id);
                Ok(id.to_string())
            }
            Step::Fund { deal, caller } => {
                let (id, kind) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                match kind {
                    DealKind::Sale => self.topology.sale().fund(id, caller)?,
                    DealKind::Rental => {
                        self.topology.rental().pay_period(id, caller)?;
                    }
                }
                self.state_of(id)
            }
            Step::PayPeriod { deal, caller } => {
                let (id, _) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                let period = self.topology.rental().pay_period(id, caller)?;
                Ok(format!("period {period} held"))
            }
            Step::Confirm { deal, caller } => {
                let (id, _) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                let state = self.topology.sale().confirm_delivery(id, caller)?;
                Ok(state.to_string())
            }
            Step::Cancel { deal, caller } => {
                let (id, kind) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                let state = match kind {
                    DealKind::Sale => self.topology.sale().cancel(id, caller)?,
                    DealKind::Rental => self.topology.rental().cancel(id, caller)?,
                };
                Ok(state.to_string())
            }
            Step::PeriodElapsed { deal, caller } => {
                let (id, _) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                let state = self.topology.rental().signal_period_elapsed(id, caller)?;
                Ok(state.to_string())
            }
            Step::TerminateEarly { deal, caller } => {
                let (id, _) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                self.topology.rental().terminate_early(id, caller)?;
                self.state_of(id)
            }
            Step::RaiseDispute { deal, caller } => {
                let (id, kind) = self.deal(deal)?;
                let caller = self.party_ref(caller);
                let state = match kind {
                    DealKind::Sale => self.topology.sale().raise_dispute(id, caller)?,
                    DealKind::Rental => self.topology.rental().raise_dispute(id, caller)?,
                };
                Ok(state.to_string())
            }
            Step::ResolveDispute { deal, outcome } => {
                let (id, kind) = self.deal(deal)?;
                let (adjudicator, outcome) = (self.adjudicator, (*outcome).into());
                let state = match kind {
                    DealKind::Sale => {
                        self.topology
                            .sale()
                            .resolve_dispute(id, adjudicator, outcome)?
                    }
                    DealKind::Rental => {
                        self.topology
                            .rental()
                            .resolve_dispute(id, adjudicator, outcome)?
                    }
                };
                Ok(state.to_string())
            }
            Step::Advance { secs } => {
                self.clock.advance_secs(*secs);
                Ok(format!("now {}", self.clock_now()))
            }
            Step::CheckDeadlines => {
                let changed = self.topology.escrow().check_all_deadlines()?;
                Ok(format!("{} deal(s) changed", changed.len()))
            }
        }
    }

    pub fn report(&self) -> Report {
        let ledger = self.topology.ledger();
        let registry = self.topology.registry();
        let escrow = self.topology.escrow();

        let balances = self
            .parties
            .iter()
            .map(|(name, id)| {
                let entry = ledger.balance(*id);
                (
                    name.clone(),
                    PartyBalance {
                        available: entry.available,
                        held: entry.held,
                    },
                )
            })
            .collect();
        let assets = self
            .assets
            .iter()
            .filter_map(|(name, id)| {
                let record = registry.asset(*id).ok()?;
                Some((
                    name.clone(),
                    AssetView {
                        owner: self.name_of(record.owner),
                        locked: !record.is_transferable(),
                    },
                ))
            })
            .collect();
        let deals = self
            .deals
            .iter()
            .filter_map(|(name, id)| {
                let deal = escrow.deal(*id).ok()?;
                Some((
                    name.clone(),
                    DealView {
                        kind: deal.kind(),
                        state: deal.state,
                        held: deal.held_amount(),
                        journal_entries: deal.journal.len(),
                        journal_head: deal.journal.head_hex(),
                        journal_verified: deal.journal.verify(*id),
                    },
                ))
            })
            .collect();

        let supply_conserved = ledger.verify_supply().is_ok();
        info!(supply_conserved, "replay report built");
        Report {
            balances,
            assets,
            deals,
            total_supply: ledger.total_supply(),
            supply_conserved,
        }
    }

    /// Party by name, created on first mention.
    fn party(&mut self, name: &str) -> PartyId {
        *self
            .parties
            .entry(name.to_owned())
            .or_insert_with(PartyId::new)
    }

    /// Party by name for a step that acts on a deal: unknown names are
    /// strangers, not errors, so authorization paths can be scripted.
    fn party_ref(&self, name: &str) -> PartyId {
        self.parties.get(name).copied().unwrap_or_default()
    }

    fn asset(&self, name: &str) -> Result<AssetId> {
        self.assets
            .get(name)
            .copied()
            .ok_or_else(|| unknown("asset", name))
    }

    fn deal(&self, name: &str) -> Result<(DealId, DealKind)> {
        let id = self
            .deals
            .get(name)
            .copied()
            .ok_or_else(|| unknown("deal", name))?;
        Ok((id, self.topology.escrow().deal(id)?.kind()))
    }

    fn state_of(&self, id: DealId) -> Result<String> {
        Ok(self.topology.escrow().deal(id)?.state.to_string())
    }

    fn name_of(&self, party: PartyId) -> String {
        self.parties
            .iter()
            .find(|(_, id)| **id == party)
            .map_or_else(|| party.to_string(), |(name, _)| name.clone())
    }

    fn clock_now(&self) -> String {
        self.topology.escrow().now().to_rfc3339()
    }
}
