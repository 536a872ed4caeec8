//! Rental period arithmetic and early-termination proration.

use chrono::{DateTime, TimeDelta, Utc};
use estate_types::{constants, Deal, ProrationPolicy, Result, SettlementError};
use rust_decimal::{Decimal, RoundingStrategy};

/// Start of rental period `period` (zero-based), once the term has started.
#[must_use]
pub fn period_start(deal: &Deal, period: u32) -> Option<DateTime<Utc>> {
    match period.checked_sub(1) {
        None => deal.rental.as_ref()?.term_started_at,
        Some(previous) => deal.period_end(previous),
    }
}

/// Has period `period` run its full length by `now`?
#[must_use]
pub fn is_elapsed(deal: &Deal, period: u32, now: DateTime<Utc>) -> bool {
    deal.period_end(period).is_some_and(|end| end <= now)
}

/// The landlord's share of an in-progress period worth `amount`, which
/// started at `start` and lasts `length`.
///
/// The elapsed fraction is taken first, so the result never exceeds
/// `amount` and the multiplication stays in range for any `amount`.
///
/// # Errors
/// `InvalidAmount` if the share cannot be represented.
pub fn landlord_share(
    policy: ProrationPolicy,
    amount: Decimal,
    start: DateTime<Utc>,
    length: TimeDelta,
    now: DateTime<Utc>,
) -> Result<Decimal> {
    match policy {
        ProrationPolicy::Forfeit => Ok(amount),
        ProrationPolicy::Prorate => {
            let length_ms = length.num_milliseconds();
            if length_ms <= 0 {
                return Ok(amount);
            }
            let elapsed_ms = (now - start).num_milliseconds().clamp(0, length_ms);
            if elapsed_ms == length_ms {
                return Ok(amount);
            }
            let fraction = Decimal::from(elapsed_ms)
                .checked_div(Decimal::from(length_ms))
                .ok_or(SettlementError::InvalidAmount { amount })?;
            let share = amount
                .checked_mul(fraction)
                .ok_or(SettlementError::InvalidAmount { amount })?;
            Ok(share
                .round_dp_with_strategy(constants::PRORATION_SCALE, RoundingStrategy::ToZero)
                .min(amount))
        }
    }
}

#[cfg(test)]
mod tests {
    use estate_types::{DealDescriptor, VenueId};

    use super::*;

    #[test]
    fn period_boundaries() {
        let start = Utc::now();
        let mut deal = Deal::open(
            VenueId::new(),
            DealDescriptor::dummy_rental(Decimal::TEN, 3),
            start,
        );
        assert!(period_start(&deal, 0).is_none());
        deal.rental.as_mut().unwrap().term_started_at = Some(start);

        assert_eq!(period_start(&deal, 0), Some(start));
        assert_eq!(period_start(&deal, 2), Some(start + TimeDelta::days(2)));
        assert!(!is_elapsed(&deal, 0, start + TimeDelta::hours(23)));
        assert!(is_elapsed(&deal, 0, start + TimeDelta::days(1)));
    }

    #[test]
    fn forfeit_keeps_whole_period() {
        let start = Utc::now();
        let share = landlord_share(
            ProrationPolicy::Forfeit,
            Decimal::TEN,
            start,
            TimeDelta::days(1),
            start + TimeDelta::hours(1),
        )
        .unwrap();
        assert_eq!(share, Decimal::TEN);
    }

    #[test]
    fn prorate_splits_by_elapsed_time() {
        let start = Utc::now();
        let share = landlord_share(
            ProrationPolicy::Prorate,
            Decimal::TEN,
            start,
            TimeDelta::days(1),
            start + TimeDelta::hours(6),
        )
        .unwrap();
        assert_eq!(share, Decimal::new(25, 1));
    }

    #[test]
    fn prorate_rounds_toward_zero() {
        let start = Utc::now();
        let share = landlord_share(
            ProrationPolicy::Prorate,
            Decimal::ONE,
            start,
            TimeDelta::seconds(3),
            start + TimeDelta::seconds(1),
        )
        .unwrap();
        assert_eq!(share, Decimal::new(333_333, 6));
    }

    #[test]
    fn prorate_clamps_to_period() {
        let start = Utc::now();
        let before = landlord_share(
            ProrationPolicy::Prorate,
            Decimal::TEN,
            start,
            TimeDelta::days(1),
            start - TimeDelta::hours(1),
        )
        .unwrap();
        assert_eq!(before, Decimal::ZERO);
        let after = landlord_share(
            ProrationPolicy::Prorate,
            Decimal::TEN,
            start,
            TimeDelta::days(1),
            start + TimeDelta::days(2),
        )
        .unwrap();
        assert_eq!(after, Decimal::TEN);
    }

    #[test]
    fn prorate_handles_base_unit_amounts() {
        // 100 tokens at 18 decimals, ten days into a thirty-day period.
        let amount = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let start = Utc::now();
        let share = landlord_share(
            ProrationPolicy::Prorate,
            amount,
            start,
            TimeDelta::days(30),
            start + TimeDelta::days(10),
        )
        .unwrap();
        assert!(share > Decimal::ZERO && share < amount);
        let third = amount / Decimal::from(3);
        assert!((share - third).abs() < Decimal::ONE);

        let whole = landlord_share(
            ProrationPolicy::Prorate,
            Decimal::MAX,
            start,
            TimeDelta::days(30),
            start + TimeDelta::days(10),
        )
        .unwrap();
        assert!(whole < Decimal::MAX);
    }
}
