//! Price resolution and fee-split arithmetic.
//!
//! # Precision guarantees
//!
//! All conversions use **fixed-point integer arithmetic**:
//!
//! - **No floating-point**: every step is integer-only
//! - **u128 intermediates**: products are widened before division so no
//!   precision is lost mid-computation
//! - **Floor rounding**: where a fractional base unit would result, the
//!   amount rounds toward zero — the same inputs and rate always resolve to
//!   the same amount
//! - **Overflow signalling**: a product that cannot be represented returns
//!   `None` instead of wrapping
//!
//! The fee split is also floor-based, and the division remainder accrues to
//! the seller's proceeds rather than being lost: `fee + proceeds == amount`
//! holds exactly for every input.

/// Decimal precision of reference prices.
pub const BASE_DECIMALS: u32 = 8;

/// Basis-point denominator for the protocol fee.
pub const BPS_DENOMINATOR: u64 = 10_000;

const fn pow10(exp: u32) -> Option<u128> {
    10u128.checked_pow(exp)
}

/// Rescale a fixed-point value from one decimal precision to another,
/// rounding toward zero. Returns `None` if the result does not fit in u64.
#[must_use]
pub fn rescale(value: u64, from_decimals: u32, to_decimals: u32) -> Option<u64> {
    let scaled = (value as u128)
        .checked_mul(pow10(to_decimals)?)?
        .checked_div(pow10(from_decimals)?)?;
    u64::try_from(scaled).ok()
}

/// Convert a reference price into payment-token base units at the given
/// rate.
///
/// `rate` is base-currency units per one whole payment token, fixed-point
/// with `rate_decimals`. The result is
/// `reference_price / rate` expressed in the token's base units, floored:
///
/// ```text
/// amount = reference_price * 10^rate_decimals * 10^token_decimals
///        / (rate * 10^BASE_DECIMALS)
/// ```
///
/// Returns `None` for a zero rate or if an intermediate or the result
/// overflows.
#[must_use]
pub fn quote_amount(
    reference_price: u64,
    rate: u64,
    rate_decimals: u32,
    token_decimals: u32,
) -> Option<u64> {
    if rate == 0 {
        return None;
    }
    let numerator = (reference_price as u128)
        .checked_mul(pow10(rate_decimals)?)?
        .checked_mul(pow10(token_decimals)?)?;
    let denominator = (rate as u128).checked_mul(pow10(BASE_DECIMALS)?)?;
    u64::try_from(numerator / denominator).ok()
}

/// Split a gross amount into `(fee, proceeds)` at `fee_bps` basis points.
///
/// The fee is floored; the remainder stays in the proceeds, so the two
/// always sum back to `amount` exactly. Callers must pass `fee_bps` in
/// `0..=10_000`.
#[must_use]
pub const fn split_fee(amount: u64, fee_bps: u16) -> (u64, u64) {
    let fee = (amount as u128 * fee_bps as u128 / BPS_DENOMINATOR as u128) as u64;
    (fee, amount - fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rescale_up_and_down() {
        // 8 -> 9 decimals multiplies by ten.
        assert_eq!(rescale(100, 8, 9), Some(1_000));
        // 9 -> 6 decimals floors away the tail.
        assert_eq!(rescale(1_234_567_891, 9, 6), Some(1_234_567));
        // Same precision is the identity.
        assert_eq!(rescale(42, 8, 8), Some(42));
    }

    #[test]
    fn rescale_overflow_is_none() {
        assert_eq!(rescale(u64::MAX, 0, 19), None);
    }

    #[test]
    fn quote_identity_rate() {
        // Rate 1.0 with 8 decimals, token with 8 decimals: amount equals the
        // reference price.
        let one = 10u64.pow(8);
        assert_eq!(quote_amount(500 * one, one, 8, 8), Some(500 * one));
    }

    #[test]
    fn quote_token_worth_two_base() {
        // Reference price 100 base, token worth 2 base each, token has 6
        // decimals: 50 whole tokens.
        let price = 100 * 10u64.pow(BASE_DECIMALS);
        let rate = 2 * 10u64.pow(8);
        assert_eq!(quote_amount(price, rate, 8, 6), Some(50 * 10u64.pow(6)));
    }

    #[test]
    fn quote_fractional_floors() {
        // Price 1 base, token worth 3 base: 0.333... tokens, floored at the
        // token's 6-decimal precision.
        let price = 10u64.pow(BASE_DECIMALS);
        let rate = 3 * 10u64.pow(8);
        assert_eq!(quote_amount(price, rate, 8, 6), Some(333_333));
    }

    #[test]
    fn quote_zero_rate_is_none() {
        assert_eq!(quote_amount(100, 0, 8, 6), None);
    }

    #[test]
    fn quote_zero_price_is_zero() {
        assert_eq!(quote_amount(0, 10u64.pow(8), 8, 6), Some(0));
    }

    #[test]
    fn quote_monotone_in_rate() {
        let price = 100 * 10u64.pow(BASE_DECIMALS);
        let cheap = quote_amount(price, 10u64.pow(8), 8, 6).expect("quote");
        let dear = quote_amount(price, 4 * 10u64.pow(8), 8, 6).expect("quote");
        assert!(dear < cheap);
    }

    #[test]
    fn split_fee_basic() {
        // 100 bps of 10_000 units is 100.
        assert_eq!(split_fee(10_000, 100), (100, 9_900));
    }

    #[test]
    fn split_fee_zero_and_full() {
        assert_eq!(split_fee(10_000, 0), (0, 10_000));
        assert_eq!(split_fee(10_000, 10_000), (10_000, 0));
    }

    #[test]
    fn split_fee_remainder_goes_to_proceeds() {
        // 25 bps of 999: fee floors to 2, the remainder stays with the
        // seller.
        let (fee, proceeds) = split_fee(999, 25);
        assert_eq!(fee, 2);
        assert_eq!(proceeds, 997);
    }

    proptest! {
        #[test]
        fn split_always_sums_back(amount in any::<u64>(), fee_bps in 0u16..=10_000) {
            let (fee, proceeds) = split_fee(amount, fee_bps);
            prop_assert_eq!(fee as u128 + proceeds as u128, amount as u128);
            prop_assert!(fee <= amount);
        }

        #[test]
        fn quote_is_deterministic(
            price in 0u64..=u64::MAX / 2,
            rate in 1u64..=u64::MAX / 2,
        ) {
            prop_assert_eq!(
                quote_amount(price, rate, 8, 6),
                quote_amount(price, rate, 8, 6)
            );
        }

        #[test]
        fn quote_never_increases_with_rate(
            price in 0u64..=10u64.pow(16),
            rate in 1u64..=10u64.pow(12),
            bump in 1u64..=10u64.pow(12),
        ) {
            let lower = quote_amount(price, rate, 8, 6);
            let higher = quote_amount(price, rate.saturating_add(bump), 8, 6);
            if let (Some(lower), Some(higher)) = (lower, higher) {
                prop_assert!(higher <= lower);
            }
        }
    }
}
