// ============================================================================
// Currency Module
// Compact currency identifiers and the metadata the rounding core reads
// ============================================================================

mod code;
mod info;

pub use code::CurrencyCode;
pub use info::{CurrencyInfo, CurrencyLookup, CurrencyTable, MinorUnit};
