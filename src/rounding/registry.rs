// ============================================================================
// Rounding Context Registry
// Deduplicating, index-addressed store of rounding contexts
// ============================================================================
//
// Locking discipline:
// - Lookups and equality scans take the shared lock and run concurrently.
// - Registration takes the upgradable lock, so only one registration can be
//   scanning-then-allocating at a time while readers continue; it upgrades to
//   the exclusive lock only for the push. A context is visible under its index
//   exactly when it is in the table, never half-registered.

use super::ambient::{self, ScopeGuard};
use super::context::{RoundingContext, RoundingContextConfig};
use super::strategy::MidpointRounding;
use crate::numeric::{MoneyError, MoneyResult};
use arrayvec::ArrayVec;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Number of distinct contexts a registry can hold (7-bit index space).
pub const CONTEXT_CAPACITY: usize = 128;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL_REGISTRY: Lazy<RoundingContextRegistry> = Lazy::new(RoundingContextRegistry::new);

struct RegistryState {
    /// Position in the table is the context index. Entries are never removed.
    contexts: ArrayVec<Arc<RoundingContext>, CONTEXT_CAPACITY>,
    /// Lower-cased name -> index
    names: HashMap<String, u8>,
}

impl RegistryState {
    fn find(&self, config: &RoundingContextConfig) -> Option<&Arc<RoundingContext>> {
        self.contexts.iter().find(|context| context.config() == config)
    }
}

/// Registry of interned rounding contexts.
///
/// Indices `0..5` are pre-assigned to the standard midpoint modes in
/// [`MidpointRounding::ALL`] order. The registry also holds the global
/// default context and resolves the ambient (scoped) context.
///
/// # Example
/// ```
/// use compact_money::rounding::{RoundingContextConfig, RoundingContextRegistry};
///
/// let registry = RoundingContextRegistry::new();
/// let a = registry.create(RoundingContextConfig::bankers().with_max_scale(4)).unwrap();
/// let b = registry.create(RoundingContextConfig::bankers().with_max_scale(4)).unwrap();
/// assert_eq!(a.index(), b.index());
/// ```
pub struct RoundingContextRegistry {
    id: u64,
    state: RwLock<RegistryState>,
    default_context: RwLock<Arc<RoundingContext>>,
}

impl RoundingContextRegistry {
    /// Create an isolated registry with the standard modes pre-registered.
    pub fn new() -> Self {
        let id = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);

        let mut contexts = ArrayVec::new();
        for mode in MidpointRounding::ALL {
            contexts.push(Arc::new(RoundingContext::new(
                mode.ordinal(),
                id,
                RoundingContextConfig::standard(mode),
            )));
        }
        let default_context = Arc::clone(&contexts[MidpointRounding::ToEven.ordinal() as usize]);

        Self {
            id,
            state: RwLock::new(RegistryState {
                contexts,
                names: HashMap::new(),
            }),
            default_context: RwLock::new(default_context),
        }
    }

    /// Process-wide registry. Money values resolve their context index here.
    pub fn global() -> &'static RoundingContextRegistry {
        &GLOBAL_REGISTRY
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Return the context for `config`, registering it if no equal
    /// configuration exists yet.
    ///
    /// # Errors
    /// - `InvalidArgument` / `OutOfRange` if the configuration is invalid
    /// - `ResourceExhausted` once all 128 indices are allocated
    pub fn create(&self, config: RoundingContextConfig) -> MoneyResult<Arc<RoundingContext>> {
        if let Some(existing) = self.state.read().find(&config) {
            tracing::trace!(index = existing.index(), "rounding context reused");
            return Ok(Arc::clone(existing));
        }

        config.validate()?;

        let state = self.state.upgradable_read();
        // Another registration may have won the race since the shared scan
        if let Some(existing) = state.find(&config) {
            return Ok(Arc::clone(existing));
        }
        if state.contexts.is_full() {
            tracing::warn!(
                capacity = CONTEXT_CAPACITY,
                ?config,
                "rounding context registry exhausted"
            );
            return Err(MoneyError::ResourceExhausted {
                capacity: CONTEXT_CAPACITY,
            });
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        let index = state.contexts.len() as u8;
        let context = Arc::new(RoundingContext::new(index, self.id, config));
        state.contexts.push(Arc::clone(&context));

        tracing::debug!(index, ?config, "registered rounding context");
        Ok(context)
    }

    /// [`create`](Self::create) and bind `name` (case-insensitive) to the
    /// result. A name already in use is rebound to the new context.
    pub fn create_named(
        &self,
        config: RoundingContextConfig,
        name: &str,
    ) -> MoneyResult<Arc<RoundingContext>> {
        if name.trim().is_empty() {
            return Err(MoneyError::invalid_argument("name", "must not be empty"));
        }

        let context = self.create(config)?;
        let previous = self
            .state
            .write()
            .names
            .insert(name.to_lowercase(), context.index());

        tracing::debug!(name, index = context.index(), ?previous, "bound rounding context name");
        Ok(context)
    }

    /// Pre-registered context for a standard midpoint mode, read straight
    /// from the index table.
    pub fn create_for_mode(&self, mode: MidpointRounding) -> MoneyResult<Arc<RoundingContext>> {
        let preassigned = self
            .state
            .read()
            .contexts
            .get(mode.ordinal() as usize)
            .filter(|context| context.strategy().mode() == Some(mode))
            .cloned();

        match preassigned {
            Some(context) => Ok(context),
            None => self.create(RoundingContextConfig::standard(mode)),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// # Errors
    /// Returns `UnknownContextIndex` if no context was registered at `index`.
    pub fn get(&self, index: u8) -> MoneyResult<Arc<RoundingContext>> {
        self.state
            .read()
            .contexts
            .get(index as usize)
            .cloned()
            .ok_or(MoneyError::UnknownContextIndex(index))
    }

    /// Context most recently bound to `name`, compared case-insensitively.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<RoundingContext>> {
        let state = self.state.read();
        let index = *state.names.get(&name.to_lowercase())?;
        state.contexts.get(index as usize).cloned()
    }

    /// Like [`get_by_name`](Self::get_by_name), reporting a missing name as an error.
    pub fn require_by_name(&self, name: &str) -> MoneyResult<Arc<RoundingContext>> {
        self.get_by_name(name)
            .ok_or_else(|| MoneyError::UnknownContextName(name.to_string()))
    }

    /// Number of registered contexts (including the pre-registered modes).
    pub fn context_count(&self) -> usize {
        self.state.read().contexts.len()
    }

    /// Whether `context` was created by this registry.
    pub fn owns(&self, context: &RoundingContext) -> bool {
        context.registry_id() == self.id
    }

    // ========================================================================
    // Default and Ambient Resolution
    // ========================================================================

    pub fn default_context(&self) -> Arc<RoundingContext> {
        Arc::clone(&self.default_context.read())
    }

    /// Replace the process-wide default context.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `context` belongs to another registry.
    pub fn set_default_context(&self, context: Arc<RoundingContext>) -> MoneyResult<()> {
        self.ensure_owned(&context)?;
        tracing::debug!(index = context.index(), "default rounding context replaced");
        *self.default_context.write() = context;
        Ok(())
    }

    /// The ambient context of the current flow of control, falling back to
    /// the default context.
    pub fn current_context(&self) -> Arc<RoundingContext> {
        ambient::current(self.id).unwrap_or_else(|| self.default_context())
    }

    /// Make `context` ambient on this thread until the guard is dropped.
    ///
    /// Guards must be released in reverse order of creation. Each guard
    /// restores the context that was ambient when it was created, so an
    /// out-of-order release leaves whatever that guard captured (a warning
    /// is logged).
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `context` belongs to another registry.
    pub fn create_scope(&self, context: Arc<RoundingContext>) -> MoneyResult<ScopeGuard> {
        self.ensure_owned(&context)?;
        Ok(ambient::enter(context))
    }

    /// Register (or reuse) `config` and make it ambient.
    pub fn create_scope_with(&self, config: RoundingContextConfig) -> MoneyResult<ScopeGuard> {
        let context = self.create(config)?;
        Ok(ambient::enter(context))
    }

    /// Make the context bound to `name` ambient.
    pub fn create_scope_named(&self, name: &str) -> MoneyResult<ScopeGuard> {
        let context = self.require_by_name(name)?;
        Ok(ambient::enter(context))
    }

    fn ensure_owned(&self, context: &RoundingContext) -> MoneyResult<()> {
        if self.owns(context) {
            Ok(())
        } else {
            Err(MoneyError::invalid_argument(
                "context",
                format!(
                    "context {} was created by a different registry",
                    context.index()
                ),
            ))
        }
    }
}

impl Default for RoundingContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}
