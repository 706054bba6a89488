// ============================================================================
// Money Errors
// Error types for currency codes, rounding contexts and money arithmetic
// ============================================================================

use crate::currency::CurrencyCode;
use thiserror::Error;

/// Errors that can occur while building or operating on monetary values.
///
/// Every precondition violation is reported to the immediate caller; nothing
/// is retried or silently downgraded to a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Malformed currency code (wrong length or characters outside 'A'..='Z')
    #[error("invalid currency code {input:?}: {reason}")]
    InvalidFormat { input: String, reason: &'static str },

    /// A factory or constructor argument violates its contract
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// A numeric argument lies outside its valid range
    #[error("`{argument}` out of range: {value} not in {min}..={max}")]
    OutOfRange {
        argument: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The rounding context index space is used up
    #[error("rounding context registry exhausted: all {capacity} indices are allocated")]
    ResourceExhausted { capacity: usize },

    /// No rounding context was ever registered under this index
    #[error("no rounding context registered at index {0}")]
    UnknownContextIndex(u8),

    /// No rounding context is bound to this name
    #[error("no rounding context registered under name {0:?}")]
    UnknownContextName(String),

    /// No metadata is known for this currency
    #[error("unknown currency {0}")]
    UnknownCurrency(CurrencyCode),

    /// Binary operation on amounts of different currencies
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        left: CurrencyCode,
        right: CurrencyCode,
    },

    /// Result does not fit in the 96-bit coefficient
    #[error("arithmetic overflow during {operation}")]
    Overflow { operation: &'static str },

    /// Rounded amount carries more significant digits than the context allows
    #[error("precision exceeded: {digits} significant digits, context allows {precision}")]
    PrecisionExceeded { digits: u32, precision: u8 },
}

impl MoneyError {
    pub(crate) fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(argument: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            argument,
            value,
            min,
            max,
        }
    }
}

/// Result type alias for money operations
pub type MoneyResult<T> = Result<T, MoneyError>;
