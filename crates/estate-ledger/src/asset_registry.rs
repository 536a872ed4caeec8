//! Property asset registry.
//!
//! Holds the canonical owner of every asset. Ordinary transfers go through
//! [`AssetRegistry::transfer_ownership`]; locking, unlocking and the
//! settlement-time title transfer require the [`CustodyKey`] the registry
//! issues exactly once, to its escrow.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Utc};
use estate_types::{AssetId, Clock, DealId, PartyId, Result, SettlementError, SystemClock};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Capability proving the holder is the escrow bound to one registry.
///
/// Not `Clone`: there is exactly one per registry.
#[derive(Debug)]
pub struct CustodyKey {
    registry: Uuid,
}

/// One property asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: AssetId,
    pub owner: PartyId,
    /// Opaque pointer to the listing metadata (IPFS CID, URL, ...).
    pub metadata_ref: String,
    /// Deal currently holding the transferability lock.
    pub locked_by: Option<DealId>,
    pub registered_at: DateTime<Utc>,
    /// Number of completed ownership changes.
    pub transfers: u64,
}

impl AssetRecord {
    #[must_use]
    pub fn is_transferable(&self) -> bool {
        self.locked_by.is_none()
    }
}

/// Registry of property assets and their owners.
pub struct AssetRegistry {
    id: Uuid,
    assets: RwLock<HashMap<AssetId, Arc<Mutex<AssetRecord>>>>,
    key_issued: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl AssetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A registry stamping registrations with `clock`, normally the one the
    /// escrow runs on.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            id: Uuid::now_v7(),
            assets: RwLock::new(HashMap::new()),
            key_issued: AtomicBool::new(false),
            clock,
        }
    }

    /// Hand out the registry's single custody key.
    ///
    /// # Errors
    /// `Unauthorized` if the key was already issued.
    pub fn issue_custody_key(&self) -> Result<CustodyKey> {
        if self.key_issued.swap(true, Ordering::SeqCst) {
            return Err(SettlementError::unauthorized(
                "custody key already issued for this registry",
            ));
        }
        Ok(CustodyKey { registry: self.id })
    }

    /// Record a new asset owned by `owner`.
    pub fn register_asset(&self, owner: PartyId, metadata_ref: impl Into<String>) -> AssetId {
        let record = AssetRecord {
            id: AssetId::new(),
            owner,
            metadata_ref: metadata_ref.into(),
            locked_by: None,
            registered_at: self.clock.now(),
            transfers: 0,
        };
        let asset_id = record.id;
        self.assets
            .write()
            .insert(asset_id, Arc::new(Mutex::new(record)));
        info!(%asset_id, %owner, "asset registered");
        asset_id
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn owner_of(&self, asset_id: AssetId) -> Result<PartyId> {
        Ok(self.slot(asset_id)?.lock().owner)
    }

    pub fn is_locked(&self, asset_id: AssetId) -> Result<bool> {
        Ok(self.slot(asset_id)?.lock().locked_by.is_some())
    }

    /// Snapshot of an asset record.
    pub fn asset(&self, asset_id: AssetId) -> Result<AssetRecord> {
        Ok(self.slot(asset_id)?.lock().clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    // ---------------------------------------------------------------
    // Ordinary transfer
    // ---------------------------------------------------------------

    /// Move title from `from` to `to`.
    ///
    /// # Errors
    /// - `NotOwner` if `from` is not the current owner
    /// - `NotTransferable` if the asset is locked by an active deal
    pub fn transfer_ownership(&self, asset_id: AssetId, from: PartyId, to: PartyId) -> Result<()> {
        let slot = self.slot(asset_id)?;
        let mut record = slot.lock();
        if record.owner != from {
            return Err(SettlementError::NotOwner {
                asset: asset_id,
                party: from,
            });
        }
        if !record.is_transferable() {
            return Err(SettlementError::NotTransferable(asset_id));
        }
        record.owner = to;
        record.transfers += 1;
        info!(%asset_id, %from, %to, "ownership transferred");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Escrow-only
    // ---------------------------------------------------------------

    /// Lock the asset for `deal`, checking it is still owned by `owner`.
    ///
    /// Re-locking by the same deal is a no-op.
    ///
    /// # Errors
    /// - `Unauthorized` for a foreign key
    /// - `AssetNotOwned` if `owner` no longer holds title
    /// - `AssetLocked` if another deal holds the lock
    pub fn lock(&self, key: &CustodyKey, asset_id: AssetId, deal: DealId, owner: PartyId) -> Result<()> {
        self.check_key(key)?;
        let slot = self.slot(asset_id)?;
        let mut record = slot.lock();
        if record.owner != owner {
            return Err(SettlementError::AssetNotOwned {
                asset: asset_id,
                party: owner,
            });
        }
        match record.locked_by {
            Some(holder) if holder != deal => Err(SettlementError::AssetLocked(asset_id)),
            _ => {
                record.locked_by = Some(deal);
                debug!(%asset_id, %deal, "asset locked");
                Ok(())
            }
        }
    }

    /// Clear `deal`'s lock. Unlocking an unlocked asset is a no-op.
    ///
    /// # Errors
    /// `Unauthorized` for a foreign key or when another deal holds the lock.
    pub fn unlock(&self, key: &CustodyKey, asset_id: AssetId, deal: DealId) -> Result<()> {
        self.check_key(key)?;
        let slot = self.slot(asset_id)?;
        let mut record = slot.lock();
        match record.locked_by {
            Some(holder) if holder != deal => Err(SettlementError::unauthorized(format!(
                "{asset_id} is locked by {holder}, not {deal}"
            ))),
            _ => {
                record.locked_by = None;
                debug!(%asset_id, %deal, "asset unlocked");
                Ok(())
            }
        }
    }

    /// Settlement-time title transfer: move a locked asset from `from` to
    /// `to` and clear the lock in one step. Only the lock-holding deal may
    /// do this.
    ///
    /// # Errors
    /// - `Unauthorized` for a foreign key or a deal not holding the lock
    /// - `NotOwner` if `from` is not the current owner
    pub fn transfer_locked(
        &self,
        key: &CustodyKey,
        asset_id: AssetId,
        deal: DealId,
        from: PartyId,
        to: PartyId,
    ) -> Result<()> {
        self.check_key(key)?;
        let slot = self.slot(asset_id)?;
        let mut record = slot.lock();
        if record.locked_by != Some(deal) {
            return Err(SettlementError::unauthorized(format!(
                "{deal} does not hold the lock on {asset_id}"
            )));
        }
        if record.owner != from {
            return Err(SettlementError::NotOwner {
                asset: asset_id,
                party: from,
            });
        }
        record.owner = to;
        record.locked_by = None;
        record.transfers += 1;
        info!(%asset_id, %deal, %from, %to, "title transferred by escrow");
        Ok(())
    }

    /// Undo a [`AssetRegistry::transfer_locked`] whose paired fund movement
    /// failed: title goes back to `previous_owner` and `deal` re-takes the lock.
    pub fn revert_transfer(
        &self,
        key: &CustodyKey,
        asset_id: AssetId,
        deal: DealId,
        previous_owner: PartyId,
    ) -> Result<()> {
        self.check_key(key)?;
        let slot = self.slot(asset_id)?;
        let mut record = slot.lock();
        record.owner = previous_owner;
        record.locked_by = Some(deal);
        record.transfers = record.transfers.saturating_sub(1);
        debug!(%asset_id, %deal, "title transfer reverted");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn slot(&self, asset_id: AssetId) -> Result<Arc<Mutex<AssetRecord>>> {
        self.assets
            .read()
            .get(&asset_id)
            .cloned()
            .ok_or(SettlementError::AssetNotFound(asset_id))
    }

    fn check_key(&self, key: &CustodyKey) -> Result<()> {
        if key.registry != self.id {
            return Err(SettlementError::unauthorized(
                "custody key belongs to another registry",
            ));
        }
        Ok(())
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use estate_types::ManualClock;

    use super::*;

    fn setup() -> (AssetRegistry, CustodyKey, PartyId, AssetId) {
        let registry = AssetRegistry::new();
        let key = registry.issue_custody_key().unwrap();
        let owner = PartyId::new();
        let asset = registry.register_asset(owner, "ipfs://villa");
        (registry, key, owner, asset)
    }

    #[test]
    fn register_and_query() {
        let (registry, _key, owner, asset) = setup();
        assert_eq!(registry.owner_of(asset).unwrap(), owner);
        assert!(!registry.is_locked(asset).unwrap());
        let record = registry.asset(asset).unwrap();
        assert_eq!(record.metadata_ref, "ipfs://villa");
        assert_eq!(record.transfers, 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registration_time_follows_injected_clock() {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let registry = AssetRegistry::with_clock(clock.clone());
        let first = registry.register_asset(PartyId::new(), "ipfs://a");
        clock.advance(TimeDelta::days(2));
        let second = registry.register_asset(PartyId::new(), "ipfs://b");
        assert_eq!(
            registry.asset(first).unwrap().registered_at.timestamp(),
            1_700_000_000
        );
        assert_eq!(registry.asset(second).unwrap().registered_at, clock.now());
    }

    #[test]
    fn unknown_asset_errors() {
        let registry = AssetRegistry::new();
        let err = registry.owner_of(AssetId::new()).unwrap_err();
        assert!(matches!(err, SettlementError::AssetNotFound(_)));
    }

    #[test]
    fn custody_key_issued_once() {
        let registry = AssetRegistry::new();
        registry.issue_custody_key().unwrap();
        let err = registry.issue_custody_key().unwrap_err();
        assert!(matches!(err, SettlementError::Unauthorized { .. }));
    }

    #[test]
    fn transfer_by_owner() {
        let (registry, _key, owner, asset) = setup();
        let buyer = PartyId::new();
        registry.transfer_ownership(asset, owner, buyer).unwrap();
        assert_eq!(registry.owner_of(asset).unwrap(), buyer);
        assert_eq!(registry.asset(asset).unwrap().transfers, 1);
    }

    #[test]
    fn transfer_by_non_owner_fails() {
        let (registry, _key, owner, asset) = setup();
        let thief = PartyId::new();
        let err = registry.transfer_ownership(asset, thief, thief).unwrap_err();
        assert!(matches!(err, SettlementError::NotOwner { .. }));
        assert_eq!(registry.owner_of(asset).unwrap(), owner);
    }

    #[test]
    fn locked_asset_is_not_transferable() {
        let (registry, key, owner, asset) = setup();
        let deal = DealId::new();
        registry.lock(&key, asset, deal, owner).unwrap();
        let err = registry
            .transfer_ownership(asset, owner, PartyId::new())
            .unwrap_err();
        assert!(matches!(err, SettlementError::NotTransferable(_)));

        registry.unlock(&key, asset, deal).unwrap();
        registry
            .transfer_ownership(asset, owner, PartyId::new())
            .unwrap();
    }

    #[test]
    fn lock_held_by_other_deal() {
        let (registry, key, owner, asset) = setup();
        registry.lock(&key, asset, DealId::new(), owner).unwrap();
        let err = registry.lock(&key, asset, DealId::new(), owner).unwrap_err();
        assert!(matches!(err, SettlementError::AssetLocked(_)));
        let err = registry.unlock(&key, asset, DealId::new()).unwrap_err();
        assert!(matches!(err, SettlementError::Unauthorized { .. }));
    }

    #[test]
    fn lock_checks_owner() {
        let (registry, key, _owner, asset) = setup();
        let err = registry
            .lock(&key, asset, DealId::new(), PartyId::new())
            .unwrap_err();
        assert!(matches!(err, SettlementError::AssetNotOwned { .. }));
    }

    #[test]
    fn foreign_key_rejected() {
        let (registry, _key, owner, asset) = setup();
        let other = AssetRegistry::new();
        let foreign = other.issue_custody_key().unwrap();
        let err = registry.lock(&foreign, asset, DealId::new(), owner).unwrap_err();
        assert!(matches!(err, SettlementError::Unauthorized { .. }));
    }

    #[test]
    fn transfer_locked_moves_title_and_unlocks() {
        let (registry, key, owner, asset) = setup();
        let deal = DealId::new();
        let buyer = PartyId::new();
        registry.lock(&key, asset, deal, owner).unwrap();
        registry
            .transfer_locked(&key, asset, deal, owner, buyer)
            .unwrap();
        let record = registry.asset(asset).unwrap();
        assert_eq!(record.owner, buyer);
        assert!(record.is_transferable());

        // The seller cannot move it back on their own.
        let err = registry
            .transfer_ownership(asset, owner, owner)
            .unwrap_err();
        assert!(matches!(err, SettlementError::NotOwner { .. }));
    }

    #[test]
    fn transfer_locked_requires_lock_holder() {
        let (registry, key, owner, asset) = setup();
        registry.lock(&key, asset, DealId::new(), owner).unwrap();
        let err = registry
            .transfer_locked(&key, asset, DealId::new(), owner, PartyId::new())
            .unwrap_err();
        assert!(matches!(err, SettlementError::Unauthorized { .. }));
        assert_eq!(registry.owner_of(asset).unwrap(), owner);
    }

    #[test]
    fn revert_restores_owner_and_lock() {
        let (registry, key, owner, asset) = setup();
        let deal = DealId::new();
        registry.lock(&key, asset, deal, owner).unwrap();
        registry
            .transfer_locked(&key, asset, deal, owner, PartyId::new())
            .unwrap();
        registry.revert_transfer(&key, asset, deal, owner).unwrap();
        let record = registry.asset(asset).unwrap();
        assert_eq!(record.owner, owner);
        assert_eq!(record.locked_by, Some(deal));
        assert_eq!(record.transfers, 0);
    }
}
