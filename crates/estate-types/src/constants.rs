//! System-wide constants for the settlement core.

/// One day in seconds.
pub const DAY_SECS: u64 = 86_400;

/// Default window for funding a `CREATED` deal before it lapses (7 days).
pub const DEFAULT_FUNDING_TIMEOUT_SECS: u64 = 7 * DAY_SECS;

/// Default window for the buyer to acknowledge a funded sale before the
/// deal escalates to `DISPUTED` (30 days).
pub const DEFAULT_ACKNOWLEDGMENT_TIMEOUT_SECS: u64 = 30 * DAY_SECS;

/// Default grace after the paid-through rental period ends before an unpaid
/// rental is terminated (3 days).
pub const DEFAULT_PAYMENT_GRACE_SECS: u64 = 3 * DAY_SECS;

/// Default rental period length (30 days).
pub const DEFAULT_PERIOD_LENGTH_SECS: u64 = 30 * DAY_SECS;

/// Upper bound on the number of periods in one rental.
pub const MAX_RENTAL_PERIODS: u32 = 600;

/// Upper bound on any configured duration (100 years).
pub const MAX_DURATION_SECS: u64 = 100 * 365 * DAY_SECS;

/// Decimal places kept when prorating a partly elapsed rental period.
/// The landlord's share is rounded toward zero.
pub const PRORATION_SCALE: u32 = 6;

/// Domain separator for journal digests.
pub const JOURNAL_DOMAIN: &[u8] = b"estate:journal:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "EstateSettle";
