// ============================================================================
// Compact Money Library
// Amount, currency and rounding context packed into a single 128-bit decimal
// ============================================================================

//! # Compact Money
//!
//! Monetary values that occupy exactly the footprint of a `rust_decimal::Decimal`.
//!
//! ## Features
//!
//! - **16-bit currency codes** packed 5 bits per letter, with `XXX` as the zero value
//! - **Zero extra fields**: currency and rounding-context index live in the
//!   unused bits of the decimal's flags word
//! - **Interned rounding contexts** addressed by a 7-bit index, deduplicated
//!   and safe to create from any thread
//! - **Ambient contexts** scoped per thread, or per task with the `async` feature
//! - **Exact allocation**: even and ratio splits that never lose a minor unit
//!
//! ## Example
//!
//! ```rust
//! use compact_money::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let usd = CurrencyCode::new("USD").unwrap();
//!
//! // Rounded half-to-even by the default context
//! let bill = Money::new(Decimal::new(10235, 3), usd).unwrap();
//! assert_eq!(bill.amount(), Decimal::new(1024, 2));
//!
//! // Temporarily round half away from zero
//! let registry = RoundingContextRegistry::global();
//! {
//!     let _scope = registry
//!         .create_scope_with(RoundingContextConfig::commercial())
//!         .unwrap();
//!     let tip = Money::new(Decimal::new(2665, 3), usd).unwrap();
//!     assert_eq!(tip.amount(), Decimal::new(267, 2));
//! }
//!
//! // Split without losing cents
//! let shares = bill.split_even(3, MidpointRounding::ToEven).unwrap();
//! let total = shares.iter().fold(Decimal::ZERO, |acc, s| acc + s.amount());
//! assert_eq!(total, bill.amount());
//! ```

pub mod currency;
pub mod money;
pub mod numeric;
pub mod rounding;

// Re-exports for convenience
pub mod prelude {
    pub use crate::currency::{
        CurrencyCode, CurrencyInfo, CurrencyLookup, CurrencyTable, MinorUnit,
    };
    pub use crate::money::{Money, PackedMoney, ProportionalAllocator};
    pub use crate::numeric::{MoneyError, MoneyResult};
    pub use crate::rounding::{
        MidpointRounding, RoundingContext, RoundingContextConfig, RoundingContextRegistry,
        RoundingStrategy, ScopeGuard,
    };
}
