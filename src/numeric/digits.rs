// ============================================================================
// Digit Inspection
// Precision and scale checks read straight off the decimal coefficient
// ============================================================================

use rust_decimal::Decimal;

/// Largest scale (fractional digits) the host decimal can carry.
pub const MAX_SCALE: u32 = 28;

/// Significant-digit budget of a default rounding context.
pub const DEFAULT_PRECISION: u8 = 28;

/// Number of decimal digits in an unsigned coefficient.
///
/// Zero counts as one digit.
#[inline]
pub const fn digit_count(coefficient: u128) -> u32 {
    match coefficient.checked_ilog10() {
        Some(log) => log + 1,
        None => 1,
    }
}

/// Number of integer (pre-point) digits in `value`. Pure fractions report zero.
#[inline]
pub fn integer_digits(value: Decimal) -> u32 {
    digit_count(value.mantissa().unsigned_abs()).saturating_sub(value.scale())
}

/// Number of significant digits in `value`, ignoring trailing fractional zeros.
///
/// `10.50` has three significant digits, `1000` has four, `0.007` has one.
#[inline]
pub fn significant_digits(value: Decimal) -> u32 {
    let normalized = value.normalize();
    let coefficient = normalized.mantissa().unsigned_abs();
    if coefficient == 0 {
        return 1;
    }
    digit_count(coefficient)
}
