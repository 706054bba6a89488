// ============================================================================
// Currency Metadata
// Minor-unit information consumed by the rounding strategies
// ============================================================================

use super::code::CurrencyCode;
use crate::numeric::{MoneyError, MoneyResult, MAX_SCALE};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// How a currency subdivides into minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinorUnit {
    /// Decimal subunits, e.g. `Digits(2)` for cents
    Digits(u8),

    /// Non-decimal subunits, e.g. 1/5 for the Malagasy ariary.
    /// `digits` is the number of fractional digits used when displaying amounts.
    Fraction { denominator: u16, digits: u8 },

    /// Rounding does not apply (precious metals, "no currency", testing codes)
    NotApplicable,
}

/// Read-only metadata for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyInfo {
    pub code: CurrencyCode,
    pub minor_unit: MinorUnit,
}

impl CurrencyInfo {
    pub const fn new(code: CurrencyCode, minor_unit: MinorUnit) -> Self {
        Self { code, minor_unit }
    }

    /// Number of fractional digits natively used by the currency.
    ///
    /// Currencies without applicable rounding report the full decimal scale.
    pub const fn decimal_digits(&self) -> u32 {
        match self.minor_unit {
            MinorUnit::Digits(digits) => digits as u32,
            MinorUnit::Fraction { digits, .. } => digits as u32,
            MinorUnit::NotApplicable => MAX_SCALE,
        }
    }

    pub const fn rounding_applies(&self) -> bool {
        !matches!(self.minor_unit, MinorUnit::NotApplicable)
    }

    pub const fn is_decimal_based(&self) -> bool {
        matches!(self.minor_unit, MinorUnit::Digits(_))
    }

    /// Multiplier converting a whole amount into minor units of a non-decimal
    /// currency (the reciprocal of the minor-unit fraction). `None` otherwise.
    pub fn scale_factor(&self) -> Option<Decimal> {
        match self.minor_unit {
            MinorUnit::Fraction { denominator, .. } => Some(Decimal::from(denominator)),
            _ => None,
        }
    }
}

// ============================================================================
// Lookup Interface
// ============================================================================

/// Source of currency metadata, keyed by compact code.
pub trait CurrencyLookup: Send + Sync {
    fn lookup(&self, code: CurrencyCode) -> Option<CurrencyInfo>;

    /// Lookup that reports unknown currencies as an error
    fn require(&self, code: CurrencyCode) -> MoneyResult<CurrencyInfo> {
        self.lookup(code).ok_or(MoneyError::UnknownCurrency(code))
    }
}

/// Built-in ISO-4217 subset: (code, minor unit)
const BUILT_IN: &[(&str, MinorUnit)] = &[
    ("USD", MinorUnit::Digits(2)),
    ("EUR", MinorUnit::Digits(2)),
    ("GBP", MinorUnit::Digits(2)),
    ("CHF", MinorUnit::Digits(2)),
    ("CAD", MinorUnit::Digits(2)),
    ("AUD", MinorUnit::Digits(2)),
    ("CNY", MinorUnit::Digits(2)),
    ("INR", MinorUnit::Digits(2)),
    ("SGD", MinorUnit::Digits(2)),
    ("IDR", MinorUnit::Digits(2)),
    ("JPY", MinorUnit::Digits(0)),
    ("KRW", MinorUnit::Digits(0)),
    ("ISK", MinorUnit::Digits(0)),
    ("BHD", MinorUnit::Digits(3)),
    ("KWD", MinorUnit::Digits(3)),
    ("JOD", MinorUnit::Digits(3)),
    ("CLF", MinorUnit::Digits(4)),
    (
        "MGA",
        MinorUnit::Fraction {
            denominator: 5,
            digits: 1,
        },
    ),
    (
        "MRU",
        MinorUnit::Fraction {
            denominator: 5,
            digits: 1,
        },
    ),
    ("XXX", MinorUnit::NotApplicable),
    ("XAU", MinorUnit::NotApplicable),
    ("XAG", MinorUnit::NotApplicable),
    ("XTS", MinorUnit::NotApplicable),
];

/// In-memory currency table.
///
/// Lookups take a shared lock; `register` takes the exclusive lock and
/// replaces any existing entry for the same code.
pub struct CurrencyTable {
    entries: RwLock<HashMap<CurrencyCode, CurrencyInfo>>,
}

static GLOBAL_TABLE: Lazy<CurrencyTable> = Lazy::new(CurrencyTable::with_iso_defaults);

impl CurrencyTable {
    /// Empty table
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Table pre-populated with the built-in ISO subset
    pub fn with_iso_defaults() -> Self {
        let entries = BUILT_IN
            .iter()
            .filter_map(|(code, minor_unit)| {
                let code = CurrencyCode::new(code).ok()?;
                Some((code, CurrencyInfo::new(code, *minor_unit)))
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Process-wide table used by `Money`.
    pub fn global() -> &'static CurrencyTable {
        &GLOBAL_TABLE
    }

    pub fn register(&self, info: CurrencyInfo) {
        tracing::debug!(
            currency = %info.code,
            minor_unit = ?info.minor_unit,
            "registered currency"
        );
        self.entries.write().insert(info.code, info);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyLookup for CurrencyTable {
    fn lookup(&self, code: CurrencyCode) -> Option<CurrencyInfo> {
        self.entries.read().get(&code).copied()
    }
}
