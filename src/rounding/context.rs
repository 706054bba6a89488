// ============================================================================
// Rounding Context
// Interned rounding configuration addressed by a 7-bit index
// ============================================================================

use super::strategy::{MidpointRounding, RoundingStrategy};
use crate::currency::{CurrencyCode, CurrencyInfo};
use crate::numeric::{significant_digits, MoneyError, MoneyResult, DEFAULT_PRECISION, MAX_SCALE};
use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration of a rounding context.
///
/// Field-wise equal configurations are interchangeable: the registry hands out
/// the same context (and index) for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoundingContextConfig {
    /// Rounding applied when a money value is constructed
    pub strategy: RoundingStrategy,

    /// Total significant-digit budget of an amount
    pub precision: u8,

    /// Optional: Upper bound on fractional digits, overriding the currency's own digits
    pub max_scale: Option<u8>,

    /// Optional: Currency used when a money value is built without one
    pub default_currency: Option<CurrencyCode>,
}

impl RoundingContextConfig {
    /// Create a configuration with the default precision and no overrides
    pub fn new(strategy: RoundingStrategy) -> Self {
        Self {
            strategy,
            precision: DEFAULT_PRECISION,
            max_scale: None,
            default_currency: None,
        }
    }

    /// Builder method: Set significant-digit budget
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Builder method: Cap fractional digits
    pub fn with_max_scale(mut self, max_scale: u8) -> Self {
        self.max_scale = Some(max_scale);
        self
    }

    /// Builder method: Set default currency
    pub fn with_default_currency(mut self, currency: CurrencyCode) -> Self {
        self.default_currency = Some(currency);
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - `InvalidArgument` if precision is zero or max scale exceeds precision
    /// - `OutOfRange` if max scale exceeds the decimal's maximum scale
    pub fn validate(&self) -> MoneyResult<()> {
        if self.precision == 0 {
            return Err(MoneyError::invalid_argument(
                "precision",
                "must be greater than zero",
            ));
        }

        if let Some(max_scale) = self.max_scale {
            if max_scale > self.precision {
                return Err(MoneyError::invalid_argument(
                    "max_scale",
                    format!(
                        "{max_scale} exceeds precision {precision}",
                        precision = self.precision
                    ),
                ));
            }
            if u32::from(max_scale) > MAX_SCALE {
                return Err(MoneyError::out_of_range(
                    "max_scale",
                    max_scale.into(),
                    0,
                    MAX_SCALE.into(),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl RoundingContextConfig {
    /// Standard midpoint rounding to the currency's minor unit
    pub fn standard(mode: MidpointRounding) -> Self {
        Self::new(RoundingStrategy::Standard(mode))
    }

    /// Amounts are stored exactly as given
    pub fn no_rounding() -> Self {
        Self::new(RoundingStrategy::NoRounding)
    }

    /// Banker's rounding (half to even), the process default
    pub fn bankers() -> Self {
        Self::standard(MidpointRounding::ToEven)
    }

    /// Commercial rounding (half away from zero)
    pub fn commercial() -> Self {
        Self::standard(MidpointRounding::AwayFromZero)
    }
}

impl Default for RoundingContextConfig {
    fn default() -> Self {
        Self::bankers()
    }
}

// ============================================================================
// Context
// ============================================================================

/// An interned rounding configuration.
///
/// Contexts are created by a [`RoundingContextRegistry`](super::RoundingContextRegistry)
/// and never mutated. The index is stable for the lifetime of the registry.
pub struct RoundingContext {
    index: u8,
    registry_id: u64,
    config: RoundingContextConfig,
}

impl RoundingContext {
    pub(crate) fn new(index: u8, registry_id: u64, config: RoundingContextConfig) -> Self {
        Self {
            index,
            registry_id,
            config,
        }
    }

    /// 7-bit handle stored inside packed money values
    #[inline]
    pub fn index(&self) -> u8 {
        self.index
    }

    #[inline]
    pub fn config(&self) -> &RoundingContextConfig {
        &self.config
    }

    #[inline]
    pub fn strategy(&self) -> RoundingStrategy {
        self.config.strategy
    }

    #[inline]
    pub fn precision(&self) -> u8 {
        self.config.precision
    }

    #[inline]
    pub fn max_scale(&self) -> Option<u8> {
        self.config.max_scale
    }

    #[inline]
    pub fn default_currency(&self) -> Option<CurrencyCode> {
        self.config.default_currency
    }

    #[inline]
    pub(crate) fn registry_id(&self) -> u64 {
        self.registry_id
    }

    /// Round with this context's strategy.
    pub fn round(
        &self,
        amount: Decimal,
        currency: &CurrencyInfo,
        decimals: Option<i32>,
    ) -> MoneyResult<Decimal> {
        self.config.strategy.round(amount, currency, decimals)
    }

    /// Round `amount` the way money construction does: to the max scale if
    /// set, otherwise the currency's digits, then enforce the precision budget.
    ///
    /// # Errors
    /// Returns `PrecisionExceeded` if the rounded amount has more significant
    /// digits than the context's precision.
    pub fn apply(&self, amount: Decimal, currency: &CurrencyInfo) -> MoneyResult<Decimal> {
        let decimals = self.config.max_scale.map(i32::from);
        let rounded = self.round(amount, currency, decimals)?;

        let digits = significant_digits(rounded);
        if digits > u32::from(self.config.precision) {
            return Err(MoneyError::PrecisionExceeded {
                digits,
                precision: self.config.precision,
            });
        }
        Ok(rounded)
    }
}

impl PartialEq for RoundingContext {
    fn eq(&self, other: &Self) -> bool {
        self.registry_id == other.registry_id && self.index == other.index
    }
}

impl Eq for RoundingContext {}

impl fmt::Debug for RoundingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundingContext")
            .field("index", &self.index)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyLookup, CurrencyTable};
    use rust_decimal_macros::dec;

    fn info(code: &str) -> CurrencyInfo {
        CurrencyTable::global()
            .require(CurrencyCode::new(code).unwrap())
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = RoundingContextConfig::default();
        assert_eq!(
            config.strategy,
            RoundingStrategy::Standard(MidpointRounding::ToEven)
        );
        assert_eq!(config.precision, 28);
        assert_eq!(config.max_scale, None);
        assert_eq!(config.default_currency, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let eur = CurrencyCode::new("EUR").unwrap();
        let config = RoundingContextConfig::commercial()
            .with_precision(18)
            .with_max_scale(4)
            .with_default_currency(eur);

        assert_eq!(config.precision, 18);
        assert_eq!(config.max_scale, Some(4));
        assert_eq!(config.default_currency, Some(eur));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let zero_precision = RoundingContextConfig::bankers().with_precision(0);
        assert!(matches!(
            zero_precision.validate(),
            Err(MoneyError::InvalidArgument { argument: "precision", .. })
        ));

        let scale_above_precision = RoundingContextConfig::bankers()
            .with_precision(4)
            .with_max_scale(5);
        assert!(matches!(
            scale_above_precision.validate(),
            Err(MoneyError::InvalidArgument { argument: "max_scale", .. })
        ));

        let scale_above_host = RoundingContextConfig::bankers()
            .with_precision(40)
            .with_max_scale(29);
        assert!(matches!(
            scale_above_host.validate(),
            Err(MoneyError::OutOfRange { argument: "max_scale", .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        let config = RoundingContextConfig::commercial()
            .with_max_scale(4)
            .with_default_currency(CurrencyCode::new("EUR").unwrap());
        let json = serde_json::to_string(&config).unwrap();
        let back: RoundingContextConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_equality() {
        assert_eq!(
            RoundingContextConfig::standard(MidpointRounding::ToEven),
            RoundingContextConfig::bankers()
        );
        assert_ne!(
            RoundingContextConfig::bankers(),
            RoundingContextConfig::bankers().with_max_scale(2)
        );
    }

    #[test]
    fn test_apply_uses_currency_digits() {
        let context = RoundingContext::new(0, 0, RoundingContextConfig::bankers());
        assert_eq!(context.apply(dec!(10.235), &info("USD")).unwrap(), dec!(10.24));
        assert_eq!(context.apply(dec!(1234.5), &info("JPY")).unwrap(), dec!(1234));
        assert_eq!(context.apply(dec!(1.23456), &info("BHD")).unwrap(), dec!(1.235));
    }

    #[test]
    fn test_apply_max_scale_overrides_currency() {
        let context = RoundingContext::new(
            5,
            0,
            RoundingContextConfig::bankers().with_max_scale(4),
        );
        assert_eq!(context.apply(dec!(10.234567), &info("USD")).unwrap(), dec!(10.2346));
    }

    #[test]
    fn test_apply_precision_budget() {
        let context = RoundingContext::new(
            5,
            0,
            RoundingContextConfig::bankers().with_precision(4),
        );
        assert_eq!(context.apply(dec!(12.344), &info("USD")).unwrap(), dec!(12.34));
        assert_eq!(
            context.apply(dec!(123.45), &info("USD")),
            Err(MoneyError::PrecisionExceeded {
                digits: 5,
                precision: 4
            })
        );
    }

    #[test]
    fn test_context_identity() {
        let a = RoundingContext::new(3, 1, RoundingContextConfig::bankers());
        let b = RoundingContext::new(3, 1, RoundingContextConfig::commercial());
        let c = RoundingContext::new(3, 2, RoundingContextConfig::bankers());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
