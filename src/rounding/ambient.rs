// ============================================================================
// Ambient Rounding Context
// Scoped, per-flow override of the registry's default context
// ============================================================================
//
// Resolution for a registry picks the most recently entered scope owned by
// that registry, looking at:
// 1. synchronous scopes on the current thread
// 2. scopes of the current tokio task (feature "async")
// and falls back to the registry's default context (handled by the registry).
//
// Every scope, synchronous or task-bound, takes a sequence number on entry,
// so a task scope opened inside a thread scope shadows it and vice versa.
// Scopes from other registries never shadow each other.

use super::context::RoundingContext;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SCOPE_SEQ: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
struct Frame {
    context: Arc<RoundingContext>,
    seq: u64,
}

impl Frame {
    fn enter(context: Arc<RoundingContext>) -> Self {
        Self {
            context,
            seq: NEXT_SCOPE_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Innermost frame owned by `registry_id`.
#[cfg(feature = "async")]
fn innermost(frames: &[Frame], registry_id: u64) -> Option<&Frame> {
    frames
        .iter()
        .rev()
        .find(|frame| frame.context.registry_id() == registry_id)
}

/// Ambient scope of one registry on the current thread.
struct Slot {
    registry_id: u64,
    frame: Frame,
    depth: usize,
}

thread_local! {
    static AMBIENT: RefCell<Vec<Slot>> = const { RefCell::new(Vec::new()) };
}

fn slot_of(slots: &[Slot], registry_id: u64) -> Option<usize> {
    slots.iter().position(|slot| slot.registry_id == registry_id)
}

#[cfg(feature = "async")]
tokio::task_local! {
    static TASK_AMBIENT: Vec<Frame>;
}

/// Restores the previously ambient context of its registry when dropped.
///
/// Tied to the thread that created it.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    context: Arc<RoundingContext>,
    previous: Option<Frame>,
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    /// The context this guard made ambient.
    pub fn context(&self) -> &Arc<RoundingContext> {
        &self.context
    }
}

pub(crate) fn enter(context: Arc<RoundingContext>) -> ScopeGuard {
    let registry_id = context.registry_id();
    let frame = Frame::enter(Arc::clone(&context));
    AMBIENT.with(|cell| {
        let mut slots = cell.borrow_mut();
        let (previous, depth) = match slot_of(&slots, registry_id) {
            Some(position) => {
                let slot = &mut slots[position];
                slot.depth += 1;
                (Some(std::mem::replace(&mut slot.frame, frame)), slot.depth)
            }
            None => {
                slots.push(Slot {
                    registry_id,
                    frame,
                    depth: 1,
                });
                (None, 1)
            }
        };
        tracing::trace!(index = context.index(), depth, "rounding scope entered");
        ScopeGuard {
            context,
            previous,
            depth,
            _not_send: PhantomData,
        }
    })
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let registry_id = self.context.registry_id();
        // The thread-local may already be gone during thread teardown
        let _ = AMBIENT.try_with(|cell| {
            let mut slots = cell.borrow_mut();
            let position = slot_of(&slots, registry_id);
            let actual_depth = position.map_or(0, |position| slots[position].depth);
            if actual_depth != self.depth {
                tracing::warn!(
                    expected_depth = self.depth,
                    actual_depth,
                    "rounding scopes released out of order"
                );
            }

            match (position, self.previous.take()) {
                (Some(position), Some(previous)) => {
                    slots[position].frame = previous;
                    slots[position].depth = self.depth - 1;
                }
                (Some(position), None) => {
                    slots.swap_remove(position);
                }
                (None, Some(previous)) => slots.push(Slot {
                    registry_id,
                    frame: previous,
                    depth: self.depth - 1,
                }),
                (None, None) => {}
            }
            tracing::trace!(depth = self.depth - 1, "rounding scope exited");
        });
    }
}

/// Ambient context belonging to the registry `registry_id`, if any.
pub(crate) fn current(registry_id: u64) -> Option<Arc<RoundingContext>> {
    let scoped = AMBIENT
        .try_with(|cell| {
            let slots = cell.borrow();
            slot_of(&slots, registry_id).map(|position| slots[position].frame.clone())
        })
        .ok()
        .flatten();

    match (scoped, task_current(registry_id)) {
        (Some(thread), Some(task)) if task.seq > thread.seq => Some(task.context),
        (Some(thread), _) => Some(thread.context),
        (None, task) => task.map(|frame| frame.context),
    }
}

#[cfg(feature = "async")]
fn task_current(registry_id: u64) -> Option<Frame> {
    TASK_AMBIENT
        .try_with(|frames| innermost(frames, registry_id).cloned())
        .ok()
        .flatten()
}

#[cfg(not(feature = "async"))]
fn task_current(_registry_id: u64) -> Option<Frame> {
    None
}

/// Run `future` with `context` ambient for the whole task, including after
/// it resumes on a different worker thread.
///
/// The scope starts when the returned future is first polled and shadows any
/// scope entered before that.
///
/// # Example
/// ```ignore
/// let context = registry.create(RoundingContextConfig::commercial())?;
/// let total = scope_async(context, async { Money::new(dec!(10.005), usd) }).await?;
/// ```
#[cfg(feature = "async")]
pub async fn scope_async<F>(context: Arc<RoundingContext>, future: F) -> F::Output
where
    F: std::future::Future,
{
    let mut frames = TASK_AMBIENT.try_with(Clone::clone).unwrap_or_default();
    frames.push(Frame::enter(context));
    TASK_AMBIENT.scope(frames, future).await
}
