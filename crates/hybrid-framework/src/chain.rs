//! Execution chain: runs one phase's behaviors over a shared context.
//!
//! # Algorithm
//!
//! 1. A cursor starts at the first behavior and `stopped` is cleared.
//! 2. The behavior under the cursor is taken and the cursor advances.
//!    - Disabled behaviors are passed over without being invoked.
//!    - Otherwise the hook is awaited with `&mut` access to the context.
//!      Errors and panics are caught, reported to the [`ChainObserver`] with
//!      the behavior ID, and swallowed: a misbehaving interceptor never
//!      aborts the message.
//!    - [`Flow::Stop`] halts the phase; everything after it is skipped.
//! 3. Once the loop ends, `stopped` is set if the cursor did not reach the
//!    end, i.e. if some behavior never got a turn.
//!
//! Hooks run strictly one after another. Two hooks of the same phase never
//! overlap, even if they suspend internally.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, trace, warn};

use crate::behavior::{Behavior, Flow, Phase};
use crate::context::BehaviorContext;
use crate::error::BehaviorError;
use crate::registry::BehaviorRegistry;

// =============================================================================
// Observer
// =============================================================================

/// Receives diagnostics emitted while a chain runs.
///
/// The default [`TracingObserver`] forwards everything to `tracing`. Tests
/// inject their own implementation to assert on what was reported.
pub trait ChainObserver: Send + Sync {
    /// A hook is about to be invoked.
    fn on_hook_start(&self, _phase: Phase, _behavior_id: &str) {}

    /// A hook returned an error.
    fn on_hook_error(&self, phase: Phase, behavior_id: &str, error: &BehaviorError);

    /// A hook panicked.
    fn on_hook_panic(&self, phase: Phase, behavior_id: &str, message: &str);

    /// A hook returned [`Flow::Stop`] with `remaining` behaviors left unrun.
    fn on_chain_stopped(&self, _phase: Phase, _behavior_id: &str, _remaining: usize) {}
}

/// Shared observer handle.
pub type BoxedObserver = Arc<dyn ChainObserver>;

/// Observer that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn on_hook_start(&self, phase: Phase, behavior_id: &str) {
        trace!(phase = %phase, behavior = behavior_id, "Executing hook");
    }

    fn on_hook_error(&self, phase: Phase, behavior_id: &str, error: &BehaviorError) {
        warn!(phase = %phase, behavior = behavior_id, error = %error, "Behavior hook failed");
    }

    fn on_hook_panic(&self, phase: Phase, behavior_id: &str, message: &str) {
        error!(phase = %phase, behavior = behavior_id, panic = message, "Behavior hook panicked");
    }

    fn on_chain_stopped(&self, phase: Phase, behavior_id: &str, remaining: usize) {
        debug!(
            phase = %phase,
            behavior = behavior_id,
            remaining,
            "Behavior stopped the chain"
        );
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Summary of one phase run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Hooks that were invoked (including ones that failed).
    pub invoked: usize,
    /// Disabled behaviors that were passed over.
    pub skipped: usize,
    /// Hooks that returned an error or panicked.
    pub failures: usize,
    /// Whether the phase ended before every behavior had its turn.
    pub stopped: bool,
    /// The behavior that returned [`Flow::Stop`], if any.
    pub stopped_by: Option<String>,
}

// =============================================================================
// ExecutionChain
// =============================================================================

/// Runs behavior hooks phase by phase.
#[derive(Clone)]
pub struct ExecutionChain {
    observer: BoxedObserver,
}

impl Default for ExecutionChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionChain {
    /// Creates a chain that reports through `tracing`.
    pub fn new() -> Self {
        Self {
            observer: Arc::new(TracingObserver),
        }
    }

    /// Creates a chain that reports to `observer`.
    pub fn with_observer(observer: BoxedObserver) -> Self {
        Self { observer }
    }

    /// Runs the before hooks of `registry` over `ctx`.
    pub async fn execute_before(
        &self,
        registry: &BehaviorRegistry,
        ctx: &mut BehaviorContext,
    ) -> ChainOutcome {
        self.run(Phase::Before, &registry.before_behaviors(), ctx)
            .await
    }

    /// Runs the after hooks of `registry` over `ctx`.
    pub async fn execute_after(
        &self,
        registry: &BehaviorRegistry,
        ctx: &mut BehaviorContext,
    ) -> ChainOutcome {
        self.run(Phase::After, &registry.after_behaviors(), ctx).await
    }

    /// Runs `behaviors` for `phase`, in order, over `ctx`.
    ///
    /// Behaviors without a hook for `phase` are passed over, so callers may
    /// hand in an unfiltered list.
    pub async fn run(
        &self,
        phase: Phase,
        behaviors: &[Arc<Behavior>],
        ctx: &mut BehaviorContext,
    ) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        ctx.stopped = false;

        let mut cursor = 0;
        while cursor < behaviors.len() {
            let behavior = &behaviors[cursor];
            cursor += 1;

            let Some(hook) = behavior.hook(phase) else {
                continue;
            };
            if !behavior.is_enabled() {
                trace!(phase = %phase, behavior = behavior.id(), "Skipping disabled behavior");
                outcome.skipped += 1;
                continue;
            }

            self.observer.on_hook_start(phase, behavior.id());
            outcome.invoked += 1;

            let result = AssertUnwindSafe(hook.call(ctx)).catch_unwind().await;
            match result {
                Ok(Ok(Flow::Continue)) => {}
                Ok(Ok(Flow::Stop)) => {
                    self.observer
                        .on_chain_stopped(phase, behavior.id(), behaviors.len() - cursor);
                    outcome.stopped_by = Some(behavior.id().to_string());
                    break;
                }
                Ok(Err(e)) => {
                    outcome.failures += 1;
                    self.observer.on_hook_error(phase, behavior.id(), &e);
                }
                Err(payload) => {
                    outcome.failures += 1;
                    self.observer
                        .on_hook_panic(phase, behavior.id(), &panic_message(payload.as_ref()));
                }
            }
        }

        outcome.stopped = cursor < behaviors.len();
        ctx.stopped = outcome.stopped;
        outcome
    }
}

impl std::fmt::Debug for ExecutionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionChain").finish_non_exhaustive()
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
