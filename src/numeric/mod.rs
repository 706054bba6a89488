// ============================================================================
// Numeric Module
// Error taxonomy and decimal digit inspection
// ============================================================================
//
// This module provides:
// - MoneyError: Error taxonomy shared by every component
// - Digit helpers: precision/scale checks on the raw coefficient
//
// Design principles:
// - No floating-point operations
// - All fallible operations return Result (no panics)
// - Digit counting works on the integer coefficient, never on formatted text

mod digits;
mod errors;

pub use digits::{digit_count, integer_digits, significant_digits, DEFAULT_PRECISION, MAX_SCALE};
pub use errors::{MoneyError, MoneyResult};
