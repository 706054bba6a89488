// ============================================================================
// Rounding Strategies
// Currency-aware rounding dispatched by the rounding context
// ============================================================================

use crate::currency::CurrencyInfo;
use crate::numeric::{MoneyError, MoneyResult, MAX_SCALE};
use rust_decimal::{Decimal, RoundingStrategy as DecimalRounding};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a value exactly halfway between two candidates is resolved.
///
/// The discriminant is also the index of the pre-registered rounding context
/// for the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum MidpointRounding {
    /// Banker's rounding: 2.5 -> 2, 3.5 -> 4
    ToEven = 0,
    /// 2.5 -> 3, -2.5 -> -3
    AwayFromZero = 1,
    /// 2.5 -> 2, -2.5 -> -2
    TowardZero = 2,
    /// 2.5 -> 2, -2.5 -> -3
    ToNegativeInfinity = 3,
    /// 2.5 -> 3, -2.5 -> -2
    ToPositiveInfinity = 4,
}

impl MidpointRounding {
    /// All modes in ordinal order.
    pub const ALL: [MidpointRounding; 5] = [
        MidpointRounding::ToEven,
        MidpointRounding::AwayFromZero,
        MidpointRounding::TowardZero,
        MidpointRounding::ToNegativeInfinity,
        MidpointRounding::ToPositiveInfinity,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Round `value` to `dp` fractional digits, breaking ties by this mode.
    pub fn round_dp(self, value: Decimal, dp: u32) -> Decimal {
        let negative = value.is_sign_negative();
        let strategy = match self {
            MidpointRounding::ToEven => DecimalRounding::MidpointNearestEven,
            MidpointRounding::AwayFromZero => DecimalRounding::MidpointAwayFromZero,
            MidpointRounding::TowardZero => DecimalRounding::MidpointTowardZero,
            // Toward -inf moves a negative tie away from zero and a positive tie toward it
            MidpointRounding::ToNegativeInfinity if negative => {
                DecimalRounding::MidpointAwayFromZero
            }
            MidpointRounding::ToNegativeInfinity => DecimalRounding::MidpointTowardZero,
            MidpointRounding::ToPositiveInfinity if negative => {
                DecimalRounding::MidpointTowardZero
            }
            MidpointRounding::ToPositiveInfinity => DecimalRounding::MidpointAwayFromZero,
        };
        value.round_dp_with_strategy(dp, strategy)
    }
}

/// Rounding applied to amounts before they are packed into a money value.
///
/// Cash-denomination rounding (nearest physical coin) is not provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoundingStrategy {
    /// Amounts are kept exactly as given
    NoRounding,
    /// Round to the currency's minor unit, ties resolved by the mode
    Standard(MidpointRounding),
}

impl RoundingStrategy {
    /// Round `amount` for `currency`.
    ///
    /// `decimals` overrides the currency's native fractional digits.
    ///
    /// # Errors
    /// - `OutOfRange` if `decimals` is negative or above the maximum decimal scale
    /// - `Overflow` if scaling a non-decimal minor unit overflows
    pub fn round(
        &self,
        amount: Decimal,
        currency: &CurrencyInfo,
        decimals: Option<i32>,
    ) -> MoneyResult<Decimal> {
        match self {
            RoundingStrategy::NoRounding => Ok(amount),
            RoundingStrategy::Standard(mode) => round_standard(*mode, amount, currency, decimals),
        }
    }

    pub fn mode(&self) -> Option<MidpointRounding> {
        match self {
            RoundingStrategy::NoRounding => None,
            RoundingStrategy::Standard(mode) => Some(*mode),
        }
    }
}

impl From<MidpointRounding> for RoundingStrategy {
    fn from(mode: MidpointRounding) -> Self {
        RoundingStrategy::Standard(mode)
    }
}

fn round_standard(
    mode: MidpointRounding,
    amount: Decimal,
    currency: &CurrencyInfo,
    decimals: Option<i32>,
) -> MoneyResult<Decimal> {
    if !currency.rounding_applies() {
        return Ok(amount);
    }

    let native = currency.decimal_digits();
    let digits = match decimals {
        Some(d) => u32::try_from(d)
            .ok()
            .filter(|d| *d <= MAX_SCALE)
            .ok_or_else(|| MoneyError::out_of_range("decimals", d.into(), 0, MAX_SCALE.into()))?,
        None => native,
    };

    match currency.scale_factor() {
        // Scale up to whole minor units, round, scale back down. Rounding in the
        // scaled-down domain gives wrong results for non-decimal minor units.
        Some(factor) => {
            let minor_units = amount
                .checked_mul(factor)
                .ok_or(MoneyError::Overflow { operation: "minor-unit scaling" })?;
            let rounded = mode.round_dp(minor_units, digits.saturating_sub(native));
            rounded
                .checked_div(factor)
                .ok_or(MoneyError::Overflow { operation: "minor-unit scaling" })
        }
        None => Ok(mode.round_dp(amount, digits)),
    }
}
