//! Message processing orchestrator.
//!
//! [`MessageProcessor`] wires the pipeline stages for one inbound message:
//!
//! ```text
//! filter ─▶ before chain ─▶ generate ─▶ after chain ─▶ dispatch
//!   │             │                          │
//!   └ Filtered    └ Vetoed                   └ Vetoed / EmptyResponse
//! ```
//!
//! Each call builds a fresh [`BehaviorContext`] that lives only as long as the
//! call. Behavior failures are absorbed by the chain; only filter panics,
//! generation failures and dispatch failures surface as [`ProcessError`].
//!
//! # Tower Service Integration
//!
//! `MessageProcessor` implements `tower::Service<AgentRuntime>`, so standard
//! middleware can wrap it:
//!
//! ```rust,ignore
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let svc = ServiceBuilder::new()
//!     .concurrency_limit(32)
//!     .service(processor);
//! let outcome = svc.oneshot(runtime).await?;
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use tower::Service;
use tracing::{Instrument, debug, error, info_span, trace};

use hybrid_core::{AgentRuntime, OutgoingMessage};

use crate::behavior::Phase;
use crate::chain::{BoxedObserver, ExecutionChain, panic_message};
use crate::context::{BehaviorContext, SendOptions};
use crate::error::{ProcessError, ProcessResult};
use crate::filter::{Filter, filters};
use crate::generation::BoxedGenerator;
use crate::registry::BehaviorRegistry;

/// A registry shared between an agent and its in-flight message tasks.
pub type SharedRegistry = Arc<RwLock<BehaviorRegistry>>;

/// How processing of a message ended, when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The top-level filter rejected the message.
    Filtered,
    /// A behavior set `filtered`; nothing was sent.
    Vetoed { phase: Phase },
    /// The generated response was empty; nothing was sent.
    EmptyResponse,
    /// The response was dispatched.
    Sent {
        message_id: String,
        send_options: SendOptions,
    },
}

impl ProcessOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Runs the behavior pipeline for inbound messages.
///
/// Cheap to clone; clones share the registry, filter and generator.
#[derive(Clone)]
pub struct MessageProcessor {
    registry: SharedRegistry,
    filter: Filter,
    generator: BoxedGenerator,
    chain: ExecutionChain,
}

impl MessageProcessor {
    /// Creates a processor with an empty registry.
    ///
    /// The default filter drops the agent's own messages.
    pub fn new(generator: BoxedGenerator) -> Self {
        Self {
            registry: SharedRegistry::default(),
            filter: !filters::from_self(),
            generator,
            chain: ExecutionChain::new(),
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_observer(mut self, observer: BoxedObserver) -> Self {
        self.chain = ExecutionChain::with_observer(observer);
        self
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Processes one inbound message end to end.
    pub async fn process(&self, runtime: AgentRuntime) -> ProcessResult<ProcessOutcome> {
        let span = info_span!(
            "process_message",
            message_id = %runtime.message.id,
            conversation_id = %runtime.conversation.id(),
        );
        self.process_inner(runtime).instrument(span).await
    }

    async fn process_inner(&self, runtime: AgentRuntime) -> ProcessResult<ProcessOutcome> {
        if !self.evaluate_filter(&runtime)? {
            trace!("Message rejected by filter");
            return Ok(ProcessOutcome::Filtered);
        }

        let mut ctx = BehaviorContext::new(runtime);

        // Snapshot per phase so the lock is never held across an await.
        let before = self.registry.read().before_behaviors();
        self.chain.run(Phase::Before, &before, &mut ctx).await;
        if ctx.send_options.is_filtered() {
            debug!(phase = %Phase::Before, "Message vetoed by behavior");
            return Ok(ProcessOutcome::Vetoed {
                phase: Phase::Before,
            });
        }

        let response = self.generator.generate(&ctx).await.map_err(|e| {
            error!(error = %e, "Response generation failed");
            ProcessError::Generation(e)
        })?;
        ctx.response = Some(response);

        let after = self.registry.read().after_behaviors();
        self.chain.run(Phase::After, &after, &mut ctx).await;
        if ctx.send_options.is_filtered() {
            debug!(phase = %Phase::After, "Response vetoed by behavior");
            return Ok(ProcessOutcome::Vetoed {
                phase: Phase::After,
            });
        }

        self.dispatch(ctx).await
    }

    fn evaluate_filter(&self, runtime: &AgentRuntime) -> ProcessResult<bool> {
        catch_unwind(AssertUnwindSafe(|| self.filter.matches(runtime))).map_err(|payload| {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "Filter panicked; dropping message");
            ProcessError::FilterPanicked(message)
        })
    }

    async fn dispatch(&self, mut ctx: BehaviorContext) -> ProcessResult<ProcessOutcome> {
        let response = match ctx.response.take() {
            Some(r) if !r.trim().is_empty() => r,
            _ => {
                debug!("Generated response is empty; nothing to send");
                return Ok(ProcessOutcome::EmptyResponse);
            }
        };

        let options = std::mem::take(&mut ctx.send_options);
        let mut outgoing = OutgoingMessage::text(response);
        outgoing.content_type = options.content_type.clone();
        outgoing.metadata = options.metadata.clone();
        if options.is_threaded() {
            outgoing = outgoing.in_reply_to(ctx.runtime().message.id.clone());
        }

        let message_id = ctx
            .conversation()
            .send(outgoing)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to dispatch response");
                ProcessError::Dispatch(e)
            })?;

        debug!(sent = %message_id, threaded = options.is_threaded(), "Response dispatched");
        Ok(ProcessOutcome::Sent {
            message_id,
            send_options: options,
        })
    }
}

impl std::fmt::Debug for MessageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageProcessor")
            .field("registry", &*self.registry.read())
            .finish_non_exhaustive()
    }
}

impl Service<AgentRuntime> for MessageProcessor {
    type Response = ProcessOutcome;
    type Error = ProcessError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, runtime: AgentRuntime) -> Self::Future {
        let this = self.clone();
        Box::pin(async move { this.process(runtime).await })
    }
}
