//! Ordered behavior registry.
//!
//! The registry is an explicit object owned by one agent: two agents in the
//! same process never share behaviors. Registration order is the execution
//! order for both phases and is never changed afterwards.
//!
//! Duplicate IDs are accepted. Both instances run, in the order they were
//! registered; a warning is logged because it is usually a mistake.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::behavior::{Behavior, Phase};

/// Holds an agent's behaviors in registration order.
#[derive(Default, Clone)]
pub struct BehaviorRegistry {
    behaviors: Vec<Arc<Behavior>>,
}

impl BehaviorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            behaviors: Vec::new(),
        }
    }

    /// Appends a behavior.
    pub fn register(&mut self, behavior: impl Into<Arc<Behavior>>) {
        let behavior = behavior.into();
        if self.behaviors.iter().any(|b| b.id() == behavior.id()) {
            warn!(
                behavior = behavior.id(),
                "Registering a behavior with a duplicate id; both instances will run"
            );
        }
        debug!(
            behavior = behavior.id(),
            before = behavior.has_before(),
            after = behavior.has_after(),
            position = self.behaviors.len(),
            "Registered behavior"
        );
        self.behaviors.push(behavior);
    }

    /// Appends many behaviors, preserving their order.
    pub fn register_all<I, B>(&mut self, behaviors: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Arc<Behavior>>,
    {
        for behavior in behaviors {
            self.register(behavior);
        }
    }

    /// Registers a behavior (builder pattern).
    pub fn with(mut self, behavior: impl Into<Arc<Behavior>>) -> Self {
        self.register(behavior);
        self
    }

    /// Returns a snapshot of every registered behavior.
    ///
    /// The returned vector is independent of the registry.
    pub fn all(&self) -> Vec<Arc<Behavior>> {
        self.behaviors.clone()
    }

    /// Returns the behaviors that define a before hook, in order.
    pub fn before_behaviors(&self) -> Vec<Arc<Behavior>> {
        self.for_phase(Phase::Before)
    }

    /// Returns the behaviors that define an after hook, in order.
    pub fn after_behaviors(&self) -> Vec<Arc<Behavior>> {
        self.for_phase(Phase::After)
    }

    /// Returns the behaviors that define a hook for `phase`, in order.
    pub fn for_phase(&self, phase: Phase) -> Vec<Arc<Behavior>> {
        self.behaviors
            .iter()
            .filter(|b| b.hook(phase).is_some())
            .cloned()
            .collect()
    }

    /// Returns the first behavior with the given ID.
    pub fn get(&self, id: &str) -> Option<Arc<Behavior>> {
        self.behaviors.iter().find(|b| b.id() == id).cloned()
    }

    /// Enables or disables every behavior with the given ID.
    ///
    /// Returns how many behaviors were updated.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> usize {
        let mut count = 0;
        for behavior in self.behaviors.iter().filter(|b| b.id() == id) {
            behavior.set_enabled(enabled);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Removes every behavior.
    pub fn clear(&mut self) {
        self.behaviors.clear();
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field(
                "behaviors",
                &self.behaviors.iter().map(|b| b.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{BoxedHook, Flow, hook_fn};

    fn noop() -> BoxedHook {
        hook_fn(|_ctx| Box::pin(async { Ok(Flow::Continue) }))
    }

    fn before(id: &str) -> Behavior {
        Behavior::builder(id).before(noop()).build().unwrap()
    }

    fn after(id: &str) -> Behavior {
        Behavior::builder(id).after(noop()).build().unwrap()
    }

    fn both(id: &str) -> Behavior {
        Behavior::builder(id)
            .before(noop())
            .after(noop())
            .build()
            .unwrap()
    }

    fn ids(behaviors: &[Arc<Behavior>]) -> Vec<&str> {
        behaviors.iter().map(|b| b.id()).collect()
    }

    #[test]
    fn test_phase_views_preserve_order() {
        let mut registry = BehaviorRegistry::new();
        registry.register_all([before("a"), after("b"), both("c"), before("d")]);

        assert_eq!(ids(&registry.all()), ["a", "b", "c", "d"]);
        assert_eq!(ids(&registry.before_behaviors()), ["a", "c", "d"]);
        assert_eq!(ids(&registry.after_behaviors()), ["b", "c"]);
    }

    #[test]
    fn test_snapshot_does_not_alias_registry() {
        let registry = BehaviorRegistry::new().with(before("a"));
        let mut snapshot = registry.all();
        snapshot.clear();
        snapshot.push(Arc::new(before("x")));

        assert_eq!(ids(&registry.all()), ["a"]);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let mut registry = BehaviorRegistry::new();
        registry.register(before("dup"));
        registry.register(before("dup"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.before_behaviors().len(), 2);
        assert_eq!(registry.set_enabled("dup", false), 2);
        assert!(registry.all().iter().all(|b| !b.is_enabled()));
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry = BehaviorRegistry::new().with(before("a")).with(after("b"));
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("a").is_none());
    }
}
