// ============================================================================
// Money
// Immutable monetary value: amount, currency and rounding context in 16 bytes
// ============================================================================

use super::allocation::ProportionalAllocator;
use super::packed::PackedMoney;
use crate::currency::{CurrencyCode, CurrencyInfo, CurrencyLookup, CurrencyTable};
use crate::numeric::{significant_digits, MoneyError, MoneyResult};
use crate::rounding::{MidpointRounding, RoundingContext, RoundingContextRegistry, RoundingStrategy};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Sub};
use std::sync::Arc;

/// A monetary amount tied to a currency and a rounding context.
///
/// The amount is always rounded against its context before it is stored, and
/// a `Money` never changes after construction. Context indices are resolved
/// against [`RoundingContextRegistry::global`] and currency metadata against
/// [`CurrencyTable::global`].
///
/// # Example
/// ```
/// use compact_money::prelude::*;
/// use rust_decimal::Decimal;
///
/// let usd = CurrencyCode::new("USD").unwrap();
/// let price = Money::new(Decimal::new(10235, 3), usd).unwrap(); // 10.235
/// assert_eq!(price.amount(), Decimal::new(1024, 2));           // 10.24 (half to even)
/// assert_eq!(std::mem::size_of::<Money>(), 16);
/// ```
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct Money(PackedMoney);

impl Money {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a money value rounded against the current ambient context.
    ///
    /// # Errors
    /// - `UnknownCurrency` if the currency has no metadata
    /// - `PrecisionExceeded` if the rounded amount exceeds the context's precision
    pub fn new(amount: Decimal, currency: CurrencyCode) -> MoneyResult<Self> {
        let context = RoundingContextRegistry::global().current_context();
        Self::with_context(amount, currency, &context)
    }

    /// Create a money value rounded against an explicit context.
    ///
    /// # Errors
    /// As [`new`](Self::new), plus `InvalidArgument` if the context was not
    /// created by the global registry.
    pub fn with_context(
        amount: Decimal,
        currency: CurrencyCode,
        context: &RoundingContext,
    ) -> MoneyResult<Self> {
        if !RoundingContextRegistry::global().owns(context) {
            return Err(MoneyError::invalid_argument(
                "context",
                "money values can only use contexts of the global registry",
            ));
        }
        let info = CurrencyTable::global().require(currency)?;
        let rounded = context.apply(amount, &info)?;
        Ok(Self::from_rounded(rounded, currency, context.index()))
    }

    /// Create a money value in the current context's default currency, or
    /// without a currency if the context has none.
    pub fn in_default_currency(amount: Decimal) -> MoneyResult<Self> {
        let context = RoundingContextRegistry::global().current_context();
        let currency = context
            .default_currency()
            .unwrap_or(CurrencyCode::NO_CURRENCY);
        Self::with_context(amount, currency, &context)
    }

    /// Zero in `currency`, tagged with the current ambient context.
    ///
    /// # Errors
    /// Returns `UnknownCurrency` if the currency has no metadata.
    pub fn zero(currency: CurrencyCode) -> MoneyResult<Self> {
        CurrencyTable::global().require(currency)?;
        let context = RoundingContextRegistry::global().current_context();
        Ok(Self::from_rounded(Decimal::ZERO, currency, context.index()))
    }

    /// Pack an amount that is already rounded for `context_index`.
    #[inline]
    pub(crate) fn from_rounded(amount: Decimal, currency: CurrencyCode, context_index: u8) -> Self {
        Self(PackedMoney::pack_unchecked(amount, currency, context_index))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0.amount()
    }

    #[inline]
    pub fn currency(&self) -> CurrencyCode {
        self.0.currency()
    }

    /// Number of fractional digits stored.
    #[inline]
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Number of significant digits in the amount.
    #[inline]
    pub fn precision(&self) -> u32 {
        significant_digits(self.amount())
    }

    #[inline]
    pub fn context_index(&self) -> u8 {
        self.0.context_index()
    }

    /// The rounding context this value was built with.
    pub fn context(&self) -> MoneyResult<Arc<RoundingContext>> {
        RoundingContextRegistry::global().get(self.context_index())
    }

    pub fn currency_info(&self) -> MoneyResult<CurrencyInfo> {
        CurrencyTable::global().require(self.currency())
    }

    /// The packed representation.
    #[inline]
    pub fn packed(&self) -> PackedMoney {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount().is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && !self.0.is_sign_negative()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    // ========================================================================
    // Arithmetic Operations
    // ========================================================================

    /// Checked addition. The result uses this value's context.
    ///
    /// # Errors
    /// Returns `CurrencyMismatch` for different currencies, `Overflow` if
    /// the sum is out of range.
    pub fn checked_add(self, rhs: Self) -> MoneyResult<Self> {
        self.ensure_same_currency(&rhs)?;
        let sum = self
            .amount()
            .checked_add(rhs.amount())
            .ok_or(MoneyError::Overflow { operation: "add" })?;
        self.rebuild(sum)
    }

    /// Checked subtraction. The result uses this value's context.
    pub fn checked_sub(self, rhs: Self) -> MoneyResult<Self> {
        self.ensure_same_currency(&rhs)?;
        let difference = self
            .amount()
            .checked_sub(rhs.amount())
            .ok_or(MoneyError::Overflow { operation: "subtract" })?;
        self.rebuild(difference)
    }

    /// Multiply by a scalar, rounding the product against this value's context.
    pub fn checked_mul(self, factor: Decimal) -> MoneyResult<Self> {
        let product = self
            .amount()
            .checked_mul(factor)
            .ok_or(MoneyError::Overflow { operation: "multiply" })?;
        self.rebuild(product)
    }

    /// Divide by a scalar, rounding the quotient against this value's context.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for a zero divisor.
    pub fn checked_div(self, divisor: Decimal) -> MoneyResult<Self> {
        if divisor.is_zero() {
            return Err(MoneyError::invalid_argument("divisor", "division by zero"));
        }
        let quotient = self
            .amount()
            .checked_div(divisor)
            .ok_or(MoneyError::Overflow { operation: "divide" })?;
        self.rebuild(quotient)
    }

    /// Negated value. Already on the rounding grid, so no re-rounding.
    pub fn negate(self) -> Self {
        Self::from_rounded(-self.amount(), self.currency(), self.context_index())
    }

    pub fn abs(self) -> Self {
        Self::from_rounded(self.amount().abs(), self.currency(), self.context_index())
    }

    /// Round to `decimals` fractional digits with `mode`, keeping currency and context.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `decimals` is negative or above the maximum scale.
    pub fn round_to(self, decimals: i32, mode: MidpointRounding) -> MoneyResult<Self> {
        let info = self.currency_info()?;
        let rounded = RoundingStrategy::Standard(mode).round(self.amount(), &info, Some(decimals))?;
        Ok(Self::from_rounded(rounded, self.currency(), self.context_index()))
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Split into `share_count` near-equal shares that sum exactly to this value.
    pub fn split_even(self, share_count: usize, mode: MidpointRounding) -> MoneyResult<Vec<Self>> {
        ProportionalAllocator::new(mode).split_even(&self, share_count)
    }

    /// Split proportionally to `ratios`; the shares sum exactly to this value.
    pub fn split_by_ratio(self, ratios: &[i64], mode: MidpointRounding) -> MoneyResult<Vec<Self>> {
        ProportionalAllocator::new(mode).split_by_ratio(&self, ratios)
    }

    fn rebuild(&self, amount: Decimal) -> MoneyResult<Self> {
        let context = self.context()?;
        Self::with_context(amount, self.currency(), &context)
    }

    fn ensure_same_currency(&self, other: &Self) -> MoneyResult<()> {
        if self.currency() == other.currency() {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency(),
                right: other.currency(),
            })
        }
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

/// Equal when currency and numeric amount match; `1.0` equals `1.00`.
impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.currency() == other.currency() && self.amount() == other.amount()
    }
}

impl Eq for Money {}

impl Hash for Money {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.currency().hash(state);
        self.amount().hash(state);
    }
}

/// Amounts in different currencies are unordered.
impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency() != other.currency() {
            return None;
        }
        Some(self.amount().cmp(&other.amount()))
    }
}

// Infallible operators for ergonomics (panic on mismatch/overflow - use checked_* in production)
impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("Money addition failed")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).expect("Money subtraction failed")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency(), self.amount())
    }
}

impl fmt::Debug for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Money")
            .field("amount", &self.amount())
            .field("currency", &self.currency())
            .field("context_index", &self.context_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounding::RoundingContextConfig;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, code("USD")).unwrap()
    }

    #[test]
    fn test_footprint() {
        assert_eq!(std::mem::size_of::<Money>(), std::mem::size_of::<Decimal>());
        assert_eq!(std::mem::size_of::<Money>(), 16);
    }

    #[test]
    fn test_construction_rounds() {
        let money = usd(dec!(10.235));
        assert_eq!(money.amount(), dec!(10.24));
        assert_eq!(money.currency(), code("USD"));
        assert_eq!(money.scale(), 2);
        assert_eq!(money.precision(), 4);
        assert_eq!(money.context_index(), 0);
        assert_eq!(money.context().unwrap().index(), 0);
    }

    #[test]
    fn test_non_decimal_currency() {
        let money = Money::new(dec!(10.22), code("MGA")).unwrap();
        assert_eq!(money.amount(), dec!(10.2));
    }

    #[test]
    fn test_explicit_context() {
        let registry = RoundingContextRegistry::global();
        let commercial = registry.create_for_mode(MidpointRounding::AwayFromZero).unwrap();
        let money = Money::with_context(dec!(10.245), code("USD"), &commercial).unwrap();
        assert_eq!(money.amount(), dec!(10.25));
        assert_eq!(money.context_index(), 1);

        let exact = registry.create(RoundingContextConfig::no_rounding()).unwrap();
        let money = Money::with_context(dec!(10.245), code("USD"), &exact).unwrap();
        assert_eq!(money.amount(), dec!(10.245));
        assert_eq!(money.context_index(), exact.index());
    }

    #[test]
    fn test_foreign_context_rejected() {
        let isolated = RoundingContextRegistry::new();
        let context = isolated.create_for_mode(MidpointRounding::ToEven).unwrap();
        let result = Money::with_context(dec!(1), code("USD"), &context);
        assert!(matches!(
            result,
            Err(MoneyError::InvalidArgument { argument: "context", .. })
        ));
    }

    #[test]
    fn test_unknown_currency() {
        let zzz = code("ZZZ");
        assert_eq!(
            Money::new(dec!(1), zzz),
            Err(MoneyError::UnknownCurrency(zzz))
        );
        assert_eq!(Money::zero(zzz), Err(MoneyError::UnknownCurrency(zzz)));
    }

    #[test]
    fn test_ambient_scope() {
        let registry = RoundingContextRegistry::global();
        let eur = code("EUR");
        {
            let _scope = registry
                .create_scope_with(
                    RoundingContextConfig::commercial().with_default_currency(eur),
                )
                .unwrap();
            let money = Money::in_default_currency(dec!(2.675)).unwrap();
            assert_eq!(money.currency(), eur);
            assert_eq!(money.amount(), dec!(2.68));
        }

        // Back on the default context: no default currency, half to even
        let money = Money::in_default_currency(dec!(2.675)).unwrap();
        assert_eq!(money.currency(), CurrencyCode::NO_CURRENCY);
        assert_eq!(money.amount(), dec!(2.675));
        assert_eq!(usd(dec!(2.675)).amount(), dec!(2.68));
        assert_eq!(usd(dec!(2.665)).amount(), dec!(2.66));
    }

    #[test]
    fn test_arithmetic() {
        let a = usd(dec!(10.50));
        let b = usd(dec!(0.75));
        assert_eq!(a.checked_add(b).unwrap().amount(), dec!(11.25));
        assert_eq!(a.checked_sub(b).unwrap().amount(), dec!(9.75));
        assert_eq!((a + b).amount(), dec!(11.25));
        assert_eq!((b - a).amount(), dec!(-9.75));
        assert_eq!(a.checked_mul(dec!(0.333)).unwrap().amount(), dec!(3.50));
        assert_eq!(a.checked_div(dec!(4)).unwrap().amount(), dec!(2.62));
        assert_eq!((-a).amount(), dec!(-10.50));
        assert_eq!((-a).abs(), a);
    }

    #[test]
    fn test_arithmetic_errors() {
        let a = usd(dec!(1));
        let eur = Money::new(dec!(1), code("EUR")).unwrap();
        assert_eq!(
            a.checked_add(eur),
            Err(MoneyError::CurrencyMismatch {
                left: code("USD"),
                right: code("EUR")
            })
        );
        assert!(matches!(
            a.checked_div(Decimal::ZERO),
            Err(MoneyError::InvalidArgument { argument: "divisor", .. })
        ));

        // Decimal::MAX has 29 significant digits, one more than the default budget
        assert_eq!(
            Money::new(Decimal::MAX, code("JPY")),
            Err(MoneyError::PrecisionExceeded {
                digits: 29,
                precision: 28
            })
        );
        let wide = RoundingContextRegistry::global()
            .create(RoundingContextConfig::bankers().with_precision(29))
            .unwrap();
        let max = Money::with_context(Decimal::MAX, code("JPY"), &wide).unwrap();
        let one = Money::with_context(dec!(1), code("JPY"), &wide).unwrap();
        assert_eq!(
            max.checked_add(one),
            Err(MoneyError::Overflow { operation: "add" })
        );
    }

    #[test]
    fn test_result_keeps_left_context() {
        let registry = RoundingContextRegistry::global();
        let exact = registry.create(RoundingContextConfig::no_rounding()).unwrap();
        let left = Money::with_context(dec!(1.001), code("USD"), &exact).unwrap();
        let right = usd(dec!(1));

        let sum = left.checked_add(right).unwrap();
        assert_eq!(sum.context_index(), exact.index());
        assert_eq!(sum.amount(), dec!(2.001));

        let sum = right.checked_add(left).unwrap();
        assert_eq!(sum.context_index(), 0);
        assert_eq!(sum.amount(), dec!(2.00));
    }

    #[test]
    fn test_predicates() {
        assert!(usd(dec!(1)).is_positive());
        assert!(usd(dec!(-1)).is_negative());
        let zero = Money::zero(code("USD")).unwrap();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());
    }

    #[test]
    fn test_default_is_zero_without_currency() {
        let money = Money::default();
        assert!(money.is_zero());
        assert_eq!(money.currency(), CurrencyCode::NO_CURRENCY);
        assert_eq!(money.context_index(), 0);
    }

    #[test]
    fn test_equality_and_ordering() {
        assert_eq!(usd(dec!(1.0)), usd(dec!(1.00)));
        assert!(usd(dec!(1)) < usd(dec!(2)));
        let eur = Money::new(dec!(1), code("EUR")).unwrap();
        assert_ne!(usd(dec!(1)), eur);
        assert_eq!(usd(dec!(1)).partial_cmp(&eur), None);
    }

    #[test]
    fn test_round_to() {
        let registry = RoundingContextRegistry::global();
        let exact = registry.create(RoundingContextConfig::no_rounding()).unwrap();
        let money = Money::with_context(dec!(1.23456), code("USD"), &exact).unwrap();
        let rounded = money.round_to(3, MidpointRounding::TowardZero).unwrap();
        assert_eq!(rounded.amount(), dec!(1.235));
        assert_eq!(rounded.context_index(), exact.index());
        assert!(money.round_to(-2, MidpointRounding::ToEven).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(usd(dec!(10.5)).to_string(), "USD 10.5");
        assert_eq!(usd(dec!(10.50)).to_string(), "USD 10.50");
        assert_eq!(
            format!("{:?}", Money::new(dec!(7), code("JPY")).unwrap()),
            "Money { amount: 7, currency: CurrencyCode(JPY), context_index: 0 }"
        );
    }
}
