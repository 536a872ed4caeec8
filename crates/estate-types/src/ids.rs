//! Globally unique identifiers used throughout the settlement core.
//!
//! All entity IDs use UUIDv7 for time-ordered lexicographic sorting. The
//! ordering matters: the ledger acquires per-party locks in ascending
//! [`PartyId`] order.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                Self(Uuid::from_bytes(bytes))
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// A participant: buyer, seller, tenant, landlord or adjudicator.
    PartyId,
    "party"
);

uuid_id!(
    /// A property asset held in the registry.
    AssetId,
    "asset"
);

uuid_id!(
    /// A single sale or rental agreement tracked by the escrow.
    DealId,
    "deal"
);

uuid_id!(
    /// A frozen, single-use allocation of a party's funds.
    HoldId,
    "hold"
);

uuid_id!(
    /// Identity of a venue wired to the escrow (marketplace or rental desk).
    VenueId,
    "venue"
);
