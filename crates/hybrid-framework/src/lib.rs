//! # Hybrid Framework
//!
//! The behavior middleware pipeline for Hybrid agents.
//!
//! This layer provides:
//! - Filter predicates that decide whether a message is processed at all
//! - Behaviors: ordered before/after interceptors around response generation
//! - The execution chain with error isolation and explicit early stop
//! - The message processor that wires filter, chains, generation and dispatch
//! - Built-in behaviors (threaded replies, reactions, filtering, rate limiting)
//!
//! The framework depends only on the collaborator traits from `hybrid-core`;
//! network transports and configuration live in the higher layers.

pub mod behavior;
pub mod behaviors;
pub mod chain;
pub mod context;
pub mod error;
pub mod filter;
pub mod generation;
pub mod processor;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use behavior::{
    Behavior, BehaviorBuilder, BehaviorConfig, BoxedHook, Flow, Hook, HookFn, HookResult, Hooks,
    Phase, hook_fn,
};
pub use chain::{BoxedObserver, ChainObserver, ChainOutcome, ExecutionChain, TracingObserver};
pub use context::{BehaviorContext, SendOptions};
pub use error::{BehaviorError, BehaviorResult, ProcessError, ProcessResult};
pub use filter::{Filter, FilterHelpers, FilterInput, create_filter, filters};
pub use generation::{BoxedGenerator, Generator, GeneratorFn, generator_fn};
pub use processor::{MessageProcessor, ProcessOutcome, SharedRegistry};
pub use registry::BehaviorRegistry;
