//! Accrual rates for triggering business events
//!
//! The booking and reservation services are external collaborators; their
//! only contract with the ledger is how a business event converts into a
//! point magnitude. Both rates live here so the conversion is defined in
//! exactly one place.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Points earned per currency unit of a property booking
pub const BOOKING_POINTS_PER_UNIT: u64 = 2;

/// Flat points earned per restaurant reservation
pub const RESERVATION_POINTS: u64 = 100;

/// Points earned for a confirmed property booking
///
/// Computed as `floor(total_price * 2)`. Negative or pathological prices
/// yield zero points; the caller rejects zero-point earns.
pub fn booking_points(total_price: Decimal) -> u64 {
    (total_price * Decimal::from(BOOKING_POINTS_PER_UNIT))
        .floor()
        .to_u64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[rstest]
    #[case::whole_price("250.00", 500)]
    #[case::fractional_floor("249.99", 499)]
    #[case::sub_unit("0.49", 0)]
    #[case::just_under_one_point("0.4999", 0)]
    #[case::half_unit("0.50", 1)]
    #[case::zero("0", 0)]
    #[case::negative("-10.00", 0)]
    fn test_booking_points(#[case] price: &str, #[case] expected: u64) {
        let price = Decimal::from_str(price).unwrap();
        assert_eq!(booking_points(price), expected);
    }
}
