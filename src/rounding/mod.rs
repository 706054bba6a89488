// ============================================================================
// Rounding Module
// Rounding strategies, interned rounding contexts and their registry
// ============================================================================

mod ambient;
mod context;
mod registry;
mod strategy;

#[cfg(feature = "async")]
pub use ambient::scope_async;
pub use ambient::ScopeGuard;
pub use context::{RoundingContext, RoundingContextConfig};
pub use registry::{RoundingContextRegistry, CONTEXT_CAPACITY};
pub use strategy::{MidpointRounding, RoundingStrategy};
