// ============================================================================
// Proportional Allocation
// Splits an amount into shares that sum exactly to the whole
// ============================================================================

use super::value::Money;
use crate::numeric::{integer_digits, significant_digits, MoneyError, MoneyResult, MAX_SCALE};
use crate::rounding::{MidpointRounding, RoundingStrategy};
use rust_decimal::Decimal;

/// Splits money into shares without losing or creating minor units.
///
/// Every share except the last is rounded to the currency's minor unit; the
/// last share is whatever is left, so it absorbs the rounding residue.
/// Currencies without a minor unit (precious metals, `XXX`) are split at the
/// finest scale the context's precision leaves room for.
///
/// # Example
/// ```text
/// Split USD 1.00 by ratios [2, 3, 3] (total 8), half to even:
///   share 0: 1.00 * 2/8 = 0.25
///   share 1: 1.00 * 3/8 = 0.375 -> 0.38
///   share 2: 1.00 - 0.25 - 0.38 = 0.37
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProportionalAllocator {
    /// Tie-breaking mode for the rounded shares
    pub mode: MidpointRounding,
}

impl ProportionalAllocator {
    pub fn new(mode: MidpointRounding) -> Self {
        Self { mode }
    }

    /// Split `money` into `share_count` near-equal shares.
    ///
    /// # Errors
    /// - `InvalidArgument` if `share_count` is less than 2
    /// - `Overflow` if the shares cannot be represented exactly
    pub fn split_even(&self, money: &Money, share_count: usize) -> MoneyResult<Vec<Money>> {
        let round = self.share_rounding(money)?;
        let shares = split_even_with(money.amount(), share_count, round)?;
        wrap_shares(money, shares)
    }

    /// Split `money` proportionally to `ratios`.
    ///
    /// # Errors
    /// - `InvalidArgument` if a ratio is negative or the ratios sum to 1 or less
    /// - `Overflow` if the shares cannot be represented exactly
    pub fn split_by_ratio(&self, money: &Money, ratios: &[i64]) -> MoneyResult<Vec<Money>> {
        let round = self.share_rounding(money)?;
        let shares = split_by_ratio_with(money.amount(), ratios, round)?;
        wrap_shares(money, shares)
    }

    /// Rounding for every share but the last.
    fn share_rounding(
        &self,
        money: &Money,
    ) -> MoneyResult<impl Fn(Decimal) -> MoneyResult<Decimal>> {
        let info = money.currency_info()?;
        let mode = self.mode;

        let bounded = if info.rounding_applies() {
            None
        } else {
            let context = money.context()?;
            let budget =
                u32::from(context.precision()).saturating_sub(integer_digits(money.amount()));
            let cap = context.max_scale().map_or(MAX_SCALE, u32::from);
            Some(exact_scale(money.amount(), budget.min(cap)))
        };

        let strategy = RoundingStrategy::Standard(mode);
        Ok(move |share: Decimal| match bounded {
            Some(decimals) => Ok(mode.round_dp(share, decimals)),
            None => strategy.round(share, &info, None),
        })
    }
}

fn wrap_shares(money: &Money, shares: Vec<Decimal>) -> MoneyResult<Vec<Money>> {
    let precision = money.context()?.precision();
    shares
        .into_iter()
        .map(|share| {
            let digits = significant_digits(share);
            if digits > u32::from(precision) {
                return Err(MoneyError::PrecisionExceeded { digits, precision });
            }
            Ok(Money::from_rounded(share, money.currency(), money.context_index()))
        })
        .collect()
}

/// Split a bare amount into `share_count` shares rounded to `decimals` digits.
///
/// Amounts too large to carry `decimals` fractional digits exactly are split
/// at the largest scale that still fits.
pub fn split_even_amount(
    amount: Decimal,
    share_count: usize,
    decimals: u32,
    mode: MidpointRounding,
) -> MoneyResult<Vec<Decimal>> {
    let decimals = exact_scale(amount, decimals);
    split_even_with(amount, share_count, |share| Ok(mode.round_dp(share, decimals)))
}

/// Split a bare amount proportionally to `ratios`, shares rounded to `decimals` digits.
///
/// The scale is capped the same way as in [`split_even_amount`].
pub fn split_by_ratio_amount(
    amount: Decimal,
    ratios: &[i64],
    decimals: u32,
    mode: MidpointRounding,
) -> MoneyResult<Vec<Decimal>> {
    let decimals = exact_scale(amount, decimals);
    split_by_ratio_with(amount, ratios, |share| Ok(mode.round_dp(share, decimals)))
}

/// Largest scale up to `decimals` at which shares of `amount` (and their
/// running total) keep every digit in the 96-bit coefficient.
fn exact_scale(amount: Decimal, decimals: u32) -> u32 {
    decimals.min(MAX_SCALE.saturating_sub(integer_digits(amount)))
}

/// `left + right`, failing where the host decimal would round the result.
fn exact_add(left: Decimal, right: Decimal) -> MoneyResult<Decimal> {
    let sum = left
        .checked_add(right)
        .ok_or(MoneyError::Overflow { operation: "split" })?;
    if sum.scale() < left.scale().max(right.scale()) {
        return Err(MoneyError::Overflow { operation: "split" });
    }
    Ok(sum)
}

fn split_even_with<R>(amount: Decimal, share_count: usize, round: R) -> MoneyResult<Vec<Decimal>>
where
    R: Fn(Decimal) -> MoneyResult<Decimal>,
{
    if share_count <= 1 {
        return Err(MoneyError::invalid_argument(
            "share_count",
            format!("{share_count} must be greater than 1"),
        ));
    }

    let per_share = round(
        amount
            .checked_div(Decimal::from(share_count))
            .ok_or(MoneyError::Overflow { operation: "split" })?,
    )?;

    let mut allocated = Decimal::ZERO;
    for _ in 1..share_count {
        allocated = exact_add(allocated, per_share)?;
    }
    let last = exact_add(amount, -allocated)?;

    let mut shares = vec![per_share; share_count - 1];
    shares.push(last);
    Ok(shares)
}

fn split_by_ratio_with<R>(amount: Decimal, ratios: &[i64], round: R) -> MoneyResult<Vec<Decimal>>
where
    R: Fn(Decimal) -> MoneyResult<Decimal>,
{
    if let Some(negative) = ratios.iter().find(|ratio| **ratio < 0) {
        return Err(MoneyError::invalid_argument(
            "ratios",
            format!("ratio {negative} is negative"),
        ));
    }
    let total = ratios
        .iter()
        .try_fold(0i64, |sum, ratio| sum.checked_add(*ratio))
        .ok_or(MoneyError::Overflow { operation: "split" })?;
    if total <= 1 {
        return Err(MoneyError::invalid_argument(
            "ratios",
            format!("ratios sum to {total}, must be greater than 1"),
        ));
    }

    let total = Decimal::from(total);
    let mut shares = Vec::with_capacity(ratios.len());
    let mut allocated = Decimal::ZERO;
    for ratio in &ratios[..ratios.len() - 1] {
        let exact = amount
            .checked_mul(Decimal::from(*ratio))
            .and_then(|scaled| scaled.checked_div(total))
            .ok_or(MoneyError::Overflow { operation: "split" })?;
        let share = round(exact)?;
        allocated = exact_add(allocated, share)?;
        shares.push(share);
    }

    shares.push(exact_add(amount, -allocated)?);
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyCode;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn sum(shares: &[Decimal]) -> Decimal {
        shares.iter().copied().sum()
    }

    #[test]
    fn test_split_even_scenario() {
        let shares = split_even_amount(dec!(0.05), 2, 2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares, vec![dec!(0.02), dec!(0.03)]);
        assert_eq!(sum(&shares), dec!(0.05));
    }

    #[test]
    fn test_split_even_remainder_goes_last() {
        let shares = split_even_amount(dec!(100), 3, 2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);

        let shares = split_even_amount(dec!(-100), 3, 2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares, vec![dec!(-33.33), dec!(-33.33), dec!(-33.34)]);
    }

    #[test]
    fn test_split_by_ratio_scenario() {
        let shares =
            split_by_ratio_amount(dec!(1.00), &[2, 3, 3], 2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares, vec![dec!(0.25), dec!(0.38), dec!(0.37)]);
        assert_eq!(sum(&shares), dec!(1.00));
    }

    #[test]
    fn test_split_by_ratio_with_zero_ratio() {
        let shares =
            split_by_ratio_amount(dec!(10), &[0, 1, 1], 2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares, vec![dec!(0), dec!(5), dec!(5)]);
    }

    #[test]
    fn test_invalid_arguments() {
        for count in [0, 1] {
            assert!(matches!(
                split_even_amount(dec!(1), count, 2, MidpointRounding::ToEven),
                Err(MoneyError::InvalidArgument { argument: "share_count", .. })
            ));
        }
        for ratios in [&[][..], &[1][..], &[0, 1][..], &[3, -1][..]] {
            assert!(matches!(
                split_by_ratio_amount(dec!(1), ratios, 2, MidpointRounding::ToEven),
                Err(MoneyError::InvalidArgument { argument: "ratios", .. })
            ));
        }
    }

    #[test]
    fn test_money_split() {
        let usd = CurrencyCode::new("USD").unwrap();
        let money = Money::new(dec!(0.05), usd).unwrap();
        let shares = money.split_even(2, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].amount(), dec!(0.02));
        assert_eq!(shares[1].amount(), dec!(0.03));
        assert!(shares.iter().all(|share| {
            share.currency() == usd && share.context_index() == money.context_index()
        }));

        let shares = Money::new(dec!(1.00), usd)
            .unwrap()
            .split_by_ratio(&[2, 3, 3], MidpointRounding::ToEven)
            .unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
        assert_eq!(amounts, vec![dec!(0.25), dec!(0.38), dec!(0.37)]);
    }

    #[test]
    fn test_money_split_non_decimal_currency() {
        // 1/5 minor units: 10 / 3 = 3.333.. -> 16.67 fifths -> 17 -> 3.4
        let mga = CurrencyCode::new("MGA").unwrap();
        let money = Money::new(dec!(10), mga).unwrap();
        let shares = money.split_even(3, MidpointRounding::ToEven).unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
        assert_eq!(amounts, vec![dec!(3.4), dec!(3.4), dec!(3.2)]);
    }

    #[test]
    fn test_split_without_minor_unit_is_exact() {
        let xau = CurrencyCode::new("XAU").unwrap();
        let money = Money::new(dec!(1000000), xau).unwrap();
        let shares = money.split_even(13, MidpointRounding::ToEven).unwrap();

        let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
        assert_eq!(amounts[0], dec!(76923.076923076923076923077));
        assert_eq!(amounts[12], dec!(76923.076923076923076923076));
        assert_eq!(sum(&amounts), dec!(1000000));
        assert!(shares.iter().all(|share| share.precision() <= 28));

        let shares = money
            .split_by_ratio(&[1, 2, 4], MidpointRounding::ToEven)
            .unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
        assert_eq!(sum(&amounts), dec!(1000000));
        assert!(shares.iter().all(|share| share.precision() <= 28));
    }

    #[test]
    fn test_money_ratio_split_non_decimal_currency() {
        let mga = CurrencyCode::new("MGA").unwrap();
        let shares = Money::new(dec!(10), mga)
            .unwrap()
            .split_by_ratio(&[1, 1, 1], MidpointRounding::ToEven)
            .unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
        assert_eq!(amounts, vec![dec!(3.4), dec!(3.4), dec!(3.2)]);
    }

    #[test]
    fn test_scale_capped_for_large_amounts() {
        // 19 integer digits leave room for 9 fractional digits
        let amount = Decimal::from(i64::MAX);
        let shares = split_even_amount(amount, 6, 28, MidpointRounding::ToEven).unwrap();
        assert_eq!(shares[0], dec!(1537228672809129301.166666667));
        assert_eq!(shares[5], dec!(1537228672809129301.166666665));
        assert_eq!(sum(&shares), amount);
    }

    fn any_mode() -> impl Strategy<Value = MidpointRounding> {
        prop::sample::select(MidpointRounding::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_split_even_is_exact(
            mantissa in -1_000_000_000_000i64..1_000_000_000_000i64,
            scale in 0u32..=4,
            share_count in 2usize..64,
            decimals in 0u32..=4,
            mode in any_mode(),
        ) {
            let amount = Decimal::new(mantissa, scale);
            let shares = split_even_amount(amount, share_count, decimals, mode).unwrap();
            prop_assert_eq!(shares.len(), share_count);
            prop_assert_eq!(sum(&shares), amount);
        }

        #[test]
        fn prop_split_by_ratio_is_exact(
            mantissa in -1_000_000_000_000i64..1_000_000_000_000i64,
            scale in 0u32..=4,
            ratios in prop::collection::vec(0i64..1000, 2..16),
            decimals in 0u32..=4,
            mode in any_mode(),
        ) {
            prop_assume!(ratios.iter().sum::<i64>() > 1);
            let amount = Decimal::new(mantissa, scale);
            let shares = split_by_ratio_amount(amount, &ratios, decimals, mode).unwrap();
            prop_assert_eq!(shares.len(), ratios.len());
            prop_assert_eq!(sum(&shares), amount);
        }

        #[test]
        fn prop_fine_scale_split_even_is_exact(
            mantissa in -i64::MAX..=i64::MAX,
            scale in 0u32..=28,
            share_count in 2usize..=64,
            decimals in 20u32..=28,
            mode in any_mode(),
        ) {
            let amount = Decimal::new(mantissa, scale);
            let shares = split_even_amount(amount, share_count, decimals, mode).unwrap();
            prop_assert_eq!(shares.len(), share_count);
            prop_assert_eq!(sum(&shares), amount);
        }

        #[test]
        fn prop_fine_scale_split_by_ratio_is_exact(
            mantissa in -i64::MAX..=i64::MAX,
            scale in 0u32..=28,
            ratios in prop::collection::vec(0i64..1000, 2..=64),
            decimals in 20u32..=28,
            mode in any_mode(),
        ) {
            prop_assume!(ratios.iter().sum::<i64>() > 1);
            let amount = Decimal::new(mantissa, scale);
            let shares = split_by_ratio_amount(amount, &ratios, decimals, mode).unwrap();
            prop_assert_eq!(shares.len(), ratios.len());
            prop_assert_eq!(sum(&shares), amount);
        }

        #[test]
        fn prop_split_without_minor_unit_is_exact(
            mantissa in 1i64..i64::MAX,
            scale in 0u32..=18,
            share_count in 2usize..=64,
        ) {
            let xag = CurrencyCode::new("XAG").unwrap();
            let money = Money::new(Decimal::new(mantissa, scale), xag).unwrap();
            let shares = money.split_even(share_count, MidpointRounding::ToEven).unwrap();
            let amounts: Vec<Decimal> = shares.iter().map(Money::amount).collect();
            prop_assert_eq!(sum(&amounts), money.amount());
            prop_assert!(shares.iter().all(|share| share.precision() <= 28));
        }
    }
}
