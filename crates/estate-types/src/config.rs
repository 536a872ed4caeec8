//! Configuration types for the escrow and its venues.
//!
//! Two layers:
//! - [`SettlementConfig`]: tunable policy, loadable from JSON.
//! - [`EscrowConfig`]: the immutable wiring record (venue identities,
//!   adjudicator, policy) the escrow is constructed with. It can only be
//!   built complete; a missing piece is [`SettlementError::ConfigurationIncomplete`].

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{constants, duration_from_secs, PartyId, Result, SettlementError, VenueId};

/// What happens to the in-progress rental period on early termination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationPolicy {
    /// The landlord keeps the whole in-progress period.
    #[default]
    Forfeit,
    /// The landlord keeps the elapsed fraction; the rest is refunded.
    Prorate,
}

/// Deadline and dispute policy applied by the escrow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EscrowPolicy {
    /// `CREATED` deals unfunded for this long lapse to `REFUNDED`.
    pub funding_timeout_secs: u64,
    /// Funded sales unacknowledged for this long escalate to `DISPUTED`.
    pub acknowledgment_timeout_secs: u64,
    /// Grace after the paid-through rental period before the rental lapses.
    pub payment_grace_secs: u64,
    pub proration: ProrationPolicy,
}

impl EscrowPolicy {
    #[must_use]
    pub fn funding_timeout(&self) -> TimeDelta {
        duration_from_secs(self.funding_timeout_secs)
    }

    #[must_use]
    pub fn acknowledgment_timeout(&self) -> TimeDelta {
        duration_from_secs(self.acknowledgment_timeout_secs)
    }

    #[must_use]
    pub fn payment_grace(&self) -> TimeDelta {
        duration_from_secs(self.payment_grace_secs)
    }
}

impl Default for EscrowPolicy {
    fn default() -> Self {
        Self {
            funding_timeout_secs: constants::DEFAULT_FUNDING_TIMEOUT_SECS,
            acknowledgment_timeout_secs: constants::DEFAULT_ACKNOWLEDGMENT_TIMEOUT_SECS,
            payment_grace_secs: constants::DEFAULT_PAYMENT_GRACE_SECS,
            proration: ProrationPolicy::default(),
        }
    }
}

/// Defaults the rental venue applies to new deals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RentalDefaults {
    pub period_length_secs: u64,
    pub max_periods: u32,
}

impl Default for RentalDefaults {
    fn default() -> Self {
        Self {
            period_length_secs: constants::DEFAULT_PERIOD_LENGTH_SECS,
            max_periods: constants::MAX_RENTAL_PERIODS,
        }
    }
}

/// Top-level tunables for a settlement topology.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettlementConfig {
    pub escrow: EscrowPolicy,
    pub rental: RentalDefaults,
}

impl SettlementConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SettlementError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("escrow.funding_timeout_secs", self.escrow.funding_timeout_secs),
            (
                "escrow.acknowledgment_timeout_secs",
                self.escrow.acknowledgment_timeout_secs,
            ),
            ("escrow.payment_grace_secs", self.escrow.payment_grace_secs),
            ("rental.period_length_secs", self.rental.period_length_secs),
        ];
        for (name, secs) in durations {
            if secs == 0 || secs > constants::MAX_DURATION_SECS {
                return Err(SettlementError::Configuration(format!(
                    "{name} must be within 1..={}, got {secs}",
                    constants::MAX_DURATION_SECS
                )));
            }
        }
        if self.rental.max_periods == 0 || self.rental.max_periods > constants::MAX_RENTAL_PERIODS {
            return Err(SettlementError::Configuration(format!(
                "rental.max_periods must be within 1..={}, got {}",
                constants::MAX_RENTAL_PERIODS,
                self.rental.max_periods
            )));
        }
        Ok(())
    }
}

/// Immutable wiring record for one escrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowConfig {
    pub sale_venue: VenueId,
    pub rental_venue: VenueId,
    /// Sole authority allowed to resolve disputes.
    pub adjudicator: PartyId,
    pub policy: EscrowPolicy,
}

impl EscrowConfig {
    #[must_use]
    pub fn builder() -> EscrowConfigBuilder {
        EscrowConfigBuilder::default()
    }
}

/// Collects the wiring pieces; [`EscrowConfigBuilder::build`] refuses to
/// produce a partial record.
#[derive(Debug, Clone, Default)]
pub struct EscrowConfigBuilder {
    sale_venue: Option<VenueId>,
    rental_venue: Option<VenueId>,
    adjudicator: Option<PartyId>,
    policy: EscrowPolicy,
}

impl EscrowConfigBuilder {
    #[must_use]
    pub fn sale_venue(mut self, venue: VenueId) -> Self {
        self.sale_venue = Some(venue);
        self
    }

    #[must_use]
    pub fn rental_venue(mut self, venue: VenueId) -> Self {
        self.rental_venue = Some(venue);
        self
    }

    #[must_use]
    pub fn adjudicator(mut self, party: PartyId) -> Self {
        self.adjudicator = Some(party);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: EscrowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<EscrowConfig> {
        let sale_venue = self
            .sale_venue
            .ok_or(SettlementError::ConfigurationIncomplete {
                missing: "sale venue",
            })?;
        let rental_venue = self
            .rental_venue
            .ok_or(SettlementError::ConfigurationIncomplete {
                missing: "rental venue",
            })?;
        let adjudicator = self
            .adjudicator
            .ok_or(SettlementError::ConfigurationIncomplete {
                missing: "adjudicator",
            })?;
        if sale_venue == rental_venue {
            return Err(SettlementError::Configuration(
                "sale and rental venues must be distinct".into(),
            ));
        }
        Ok(EscrowConfig {
            sale_venue,
            rental_venue,
            adjudicator,
            policy: self.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy = EscrowPolicy::default();
        assert_eq!(policy.funding_timeout(), TimeDelta::days(7));
        assert_eq!(policy.acknowledgment_timeout(), TimeDelta::days(30));
        assert_eq!(policy.payment_grace(), TimeDelta::days(3));
        assert_eq!(policy.proration, ProrationPolicy::Forfeit);
    }

    #[test]
    fn json_partial_fills_defaults() {
        let cfg = SettlementConfig::from_json_str(
            r#"{ "escrow": { "proration": "prorate", "payment_grace_secs": 60 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.escrow.proration, ProrationPolicy::Prorate);
        assert_eq!(cfg.escrow.payment_grace_secs, 60);
        assert_eq!(
            cfg.escrow.funding_timeout_secs,
            constants::DEFAULT_FUNDING_TIMEOUT_SECS
        );
        assert_eq!(cfg.rental, RentalDefaults::default());
    }

    #[test]
    fn json_rejects_zero_duration() {
        let err = SettlementConfig::from_json_str(r#"{ "rental": { "period_length_secs": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, SettlementError::Configuration(_)));
    }

    #[test]
    fn json_rejects_garbage() {
        let err = SettlementConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, SettlementError::Configuration(_)));
    }

    #[test]
    fn builder_requires_every_piece() {
        let err = EscrowConfig::builder()
            .sale_venue(VenueId::new())
            .adjudicator(PartyId::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::ConfigurationIncomplete {
                missing: "rental venue"
            }
        ));

        let err = EscrowConfig::builder()
            .sale_venue(VenueId::new())
            .rental_venue(VenueId::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SettlementError::ConfigurationIncomplete {
                missing: "adjudicator"
            }
        ));
    }

    #[test]
    fn builder_rejects_shared_venue() {
        let venue = VenueId::new();
        let err = EscrowConfig::builder()
            .sale_venue(venue)
            .rental_venue(venue)
            .adjudicator(PartyId::new())
            .build()
            .unwrap_err();
        assert!(matches!(err, SettlementError::Configuration(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = SettlementConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = SettlementConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
