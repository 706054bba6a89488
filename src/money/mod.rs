// ============================================================================
// Money Module
// Packed monetary values and exact proportional allocation
// ============================================================================

mod allocation;
mod packed;
mod value;

pub use allocation::{split_by_ratio_amount, split_even_amount, ProportionalAllocator};
pub use packed::{PackedMoney, MAX_CONTEXT_INDEX};
pub use value::Money;
