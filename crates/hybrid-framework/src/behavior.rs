//! Behaviors: named, configurable interceptors around response generation.
//!
//! A [`Behavior`] carries an ID, an enabled flag, a free-form data map that
//! records how it was configured, and one or two hooks. Which hooks exist is
//! encoded in the [`Hooks`] variant, so the registry never has to check for
//! an optional method at runtime.
//!
//! # Hooks
//!
//! A hook is anything implementing [`Hook`]. For one-off closures use
//! [`hook_fn`]:
//!
//! ```rust,ignore
//! use hybrid_framework::{Behavior, Flow, hook_fn};
//!
//! let behavior = Behavior::builder("mark-markdown")
//!     .after(hook_fn(|ctx| {
//!         Box::pin(async move {
//!             ctx.send_options.content_type = Some("markdown".into());
//!             Ok(Flow::Continue)
//!         })
//!     }))
//!     .build()?;
//! ```
//!
//! A hook returns [`Flow::Continue`] to hand control to the next behavior in
//! the phase, or [`Flow::Stop`] to veto every later behavior in that phase.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::BehaviorContext;
use crate::error::{BehaviorError, BehaviorResult};

// ============================================================================
// Phase & Flow
// ============================================================================

/// The stage of the pipeline a hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the response is generated.
    Before,
    /// After the response is generated, before it is dispatched.
    After,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the chain should do after a hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Run the next behavior in the phase.
    #[default]
    Continue,
    /// Skip every remaining behavior in the phase.
    Stop,
}

/// Result type returned by hooks.
pub type HookResult = BehaviorResult<Flow>;

// ============================================================================
// Hook trait
// ============================================================================

/// A single pre- or post-response interceptor.
///
/// The context is only borrowed for the duration of the call; anything a
/// hook needs to remember across messages belongs in the hook itself.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult;
}

/// A shared, type-erased hook.
pub type BoxedHook = Arc<dyn Hook>;

/// Adapter that turns a closure into a [`Hook`].
pub struct HookFn<F> {
    f: F,
}

#[async_trait]
impl<F> Hook for HookFn<F>
where
    F: for<'a> Fn(&'a mut BehaviorContext) -> BoxFuture<'a, HookResult> + Send + Sync,
{
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult {
        (self.f)(ctx).await
    }
}

/// Wraps a closure returning a boxed future as a [`BoxedHook`].
pub fn hook_fn<F>(f: F) -> BoxedHook
where
    F: for<'a> Fn(&'a mut BehaviorContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    Arc::new(HookFn { f })
}

// ============================================================================
// Hooks variant
// ============================================================================

/// The hooks a behavior defines.
#[derive(Clone)]
pub enum Hooks {
    Before(BoxedHook),
    After(BoxedHook),
    Both { before: BoxedHook, after: BoxedHook },
}

impl Hooks {
    /// Returns the pre-response hook, if defined.
    pub fn before(&self) -> Option<&BoxedHook> {
        match self {
            Self::Before(h) | Self::Both { before: h, .. } => Some(h),
            Self::After(_) => None,
        }
    }

    /// Returns the post-response hook, if defined.
    pub fn after(&self) -> Option<&BoxedHook> {
        match self {
            Self::After(h) | Self::Both { after: h, .. } => Some(h),
            Self::Before(_) => None,
        }
    }

    /// Returns the hook for `phase`, if defined.
    pub fn for_phase(&self, phase: Phase) -> Option<&BoxedHook> {
        match phase {
            Phase::Before => self.before(),
            Phase::After => self.after(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Before(_) => "before",
            Self::After(_) => "after",
            Self::Both { .. } => "both",
        }
    }
}

// ============================================================================
// BehaviorConfig
// ============================================================================

/// The configuration a behavior was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Behavior-specific settings, e.g. `{ "reaction": "👍" }`.
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data: Map::new(),
        }
    }
}

// ============================================================================
// Behavior
// ============================================================================

/// A named interceptor with a pre-response hook, a post-response hook, or both.
///
/// Everything but the enabled flag is fixed at build time. The flag is atomic
/// so the owning configuration can toggle a behavior that is already shared
/// with in-flight message tasks.
pub struct Behavior {
    id: String,
    enabled: AtomicBool,
    data: Map<String, Value>,
    hooks: Hooks,
}

impl Behavior {
    /// Starts building a behavior with the given ID.
    pub fn builder(id: impl Into<String>) -> BehaviorBuilder {
        BehaviorBuilder::new(id)
    }

    /// Creates a behavior directly from its parts.
    pub fn new(id: impl Into<String>, config: BehaviorConfig, hooks: Hooks) -> Self {
        Self {
            id: id.into(),
            enabled: AtomicBool::new(config.enabled),
            data: config.data,
            hooks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Returns the behavior-specific configuration data.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> BehaviorConfig {
        BehaviorConfig {
            enabled: self.is_enabled(),
            data: self.data.clone(),
        }
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn has_before(&self) -> bool {
        self.hooks.before().is_some()
    }

    pub fn has_after(&self) -> bool {
        self.hooks.after().is_some()
    }

    /// Returns the hook for `phase`, if this behavior defines one.
    pub fn hook(&self, phase: Phase) -> Option<&BoxedHook> {
        self.hooks.for_phase(phase)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("enabled", &self.is_enabled())
            .field("data", &self.data)
            .field("hooks", &self.hooks.describe())
            .finish()
    }
}

// ============================================================================
// BehaviorBuilder
// ============================================================================

/// Builder for [`Behavior`].
///
/// `build` fails when the ID is empty or no hook was supplied, since such a
/// behavior could never run.
pub struct BehaviorBuilder {
    id: String,
    config: BehaviorConfig,
    before: Option<BoxedHook>,
    after: Option<BoxedHook>,
}

impl BehaviorBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: BehaviorConfig::default(),
            before: None,
            after: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BehaviorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Adds one entry to the configuration data.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.data.insert(key.into(), value.into());
        self
    }

    pub fn before(mut self, hook: BoxedHook) -> Self {
        self.before = Some(hook);
        self
    }

    pub fn after(mut self, hook: BoxedHook) -> Self {
        self.after = Some(hook);
        self
    }

    pub fn build(self) -> BehaviorResult<Behavior> {
        if self.id.trim().is_empty() {
            return Err(BehaviorError::InvalidConfig(
                "behavior id must not be empty".into(),
            ));
        }

        let hooks = match (self.before, self.after) {
            (Some(before), Some(after)) => Hooks::Both { before, after },
            (Some(before), None) => Hooks::Before(before),
            (None, Some(after)) => Hooks::After(after),
            (None, None) => {
                return Err(BehaviorError::InvalidConfig(format!(
                    "behavior '{}' defines neither a before nor an after hook",
                    self.id
                )));
            }
        };

        Ok(Behavior::new(self.id, self.config, hooks))
    }
}
