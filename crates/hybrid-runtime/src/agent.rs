//! The agent: configuration, collaborators and the behavior pipeline in one handle.
//!
//! ```rust,ignore
//! use hybrid_runtime::prelude::*;
//!
//! let agent = Agent::builder()
//!     .config(ConfigLoader::new().load()?)
//!     .client(Arc::new(my_client))
//!     .generator(Arc::new(my_model))
//!     .behavior(react_with("👀", ReactWithConfig::default()))
//!     .behavior(threaded_reply(ThreadedReplyConfig::default()))
//!     .build()?;
//!
//! // Messages from the messaging network:
//! let outcome = agent.process(runtime).await?;
//!
//! // Events from external sources, until Ctrl+C:
//! agent.run().await?;
//! ```
//!
//! # Events
//!
//! `Agent` implements [`EventHandler`]. A forwarded event must carry the target
//! conversation in `data.conversationId`; the event becomes a synthetic
//! message whose sender inbox ID is `event:<type>` and runs through the same
//! pipeline as any other message. The HTTP response waits for the pipeline:
//! a failed generation or dispatch answers `500`, so the forwarder retries.
//! Filtered, vetoed and empty outcomes still answer `200`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use hybrid_core::{AgentRuntime, BoxedClient, DecodedMessage, Event, Sender};
use hybrid_framework::{
    Behavior, BoxedGenerator, BoxedObserver, Filter, MessageProcessor, ProcessOutcome,
    ProcessResult, SharedRegistry,
};
use hybrid_transport::{EventForwarder, EventHandler, EventRejection, EventServer};

use crate::config::{HybridConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};

/// Data key that names the conversation an event belongs to.
pub const CONVERSATION_ID_KEY: &str = "conversationId";

// =============================================================================
// Agent
// =============================================================================

/// A configured agent. Cheap to clone; clones share the behavior registry.
#[derive(Clone)]
pub struct Agent {
    config: Arc<HybridConfig>,
    client: BoxedClient,
    processor: MessageProcessor,
    event_seq: Arc<AtomicU64>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    pub fn processor(&self) -> &MessageProcessor {
        &self.processor
    }

    pub fn registry(&self) -> &SharedRegistry {
        self.processor.registry()
    }

    /// Runs one inbound message through the pipeline.
    pub async fn process(&self, runtime: AgentRuntime) -> ProcessResult<ProcessOutcome> {
        self.processor.process(runtime).await
    }

    /// Appends behaviors after the ones already registered.
    ///
    /// Messages already in flight keep the snapshot they started with.
    pub fn use_behaviors<I>(&self, behaviors: I)
    where
        I: IntoIterator<Item = Behavior>,
    {
        self.registry().write().register_all(behaviors);
    }

    /// Removes every behavior.
    pub fn clear_behaviors(&self) {
        self.registry().write().clear();
    }

    /// Enables or disables every behavior with `id`; returns how many matched.
    pub fn set_behavior_enabled(&self, id: &str, enabled: bool) -> usize {
        self.registry().read().set_enabled(id, enabled)
    }

    /// Builds a forwarder that delivers events according to `[forwarder]`.
    pub fn forwarder(&self) -> RuntimeResult<EventForwarder> {
        Ok(EventForwarder::new(self.config.forwarder.clone())?)
    }

    /// Serves the event ingress on the configured address until `shutdown` fires.
    pub async fn serve(&self, shutdown: CancellationToken) -> RuntimeResult<()> {
        let server = EventServer::bind(&self.config.server.addr()).await?;
        self.serve_with(server, shutdown).await
    }

    /// Serves the event ingress on an already bound listener.
    pub async fn serve_with(
        &self,
        server: EventServer,
        shutdown: CancellationToken,
    ) -> RuntimeResult<()> {
        info!(
            agent = %self.config.agent.name,
            addr = %server.local_addr(),
            "Agent accepting events"
        );
        server.serve(Arc::new(self.clone()), shutdown).await?;
        Ok(())
    }

    /// Serves events until Ctrl+C or SIGTERM.
    pub async fn run(&self) -> RuntimeResult<()> {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            trigger.cancel();
        });

        info!(agent = %self.config.agent.name, "Agent is now running. Press Ctrl+C to stop.");
        self.serve(shutdown).await
    }

    fn next_event_message_id(&self) -> String {
        let seq = self.event_seq.fetch_add(1, Ordering::Relaxed);
        format!("event-{}-{seq}", now_ns())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.agent.name)
            .field("client", &self.client.inbox_id())
            .field("processor", &self.processor)
            .finish()
    }
}

#[async_trait]
impl EventHandler for Agent {
    async fn handle_event(&self, event: Event) -> Result<String, EventRejection> {
        let conversation_id = match event.str_field(CONVERSATION_ID_KEY) {
            Some(id) => id.to_owned(),
            None => {
                return Err(EventRejection::bad_request(format!(
                    "event data is missing '{CONVERSATION_ID_KEY}'"
                )));
            }
        };

        let conversation = match self.client.conversation(&conversation_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                return Err(EventRejection::not_found(format!(
                    "conversation '{conversation_id}' not found"
                )));
            }
            Err(e) => {
                error!(conversation = %conversation_id, error = %e, "Conversation lookup failed");
                return Err(EventRejection::internal(e.to_string()));
            }
        };

        let event_type = event.event_type.clone();
        let mut message =
            DecodedMessage::from_event(self.next_event_message_id(), conversation_id, event);
        message.sent_at_ns = now_ns();
        let sender = Sender::new(message.sender_inbox_id.clone());
        let runtime = AgentRuntime::new(conversation, message, sender, self.client.clone());

        let span = info_span!("event", event = %event_type);
        match self.processor.process(runtime).instrument(span).await {
            Ok(outcome) => {
                debug!(event = %event_type, ?outcome, "Event processed");
                Ok(format!("Event '{event_type}' processed"))
            }
            Err(e) => {
                error!(event = %event_type, error = %e, "Event processing failed");
                Err(EventRejection::internal(e.to_string()))
            }
        }
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C; shutting down"),
    }
}

// =============================================================================
// AgentBuilder
// =============================================================================

/// Builder for [`Agent`].
///
/// A client and a generator are required. Behaviors are registered in the
/// order they are added.
#[derive(Default)]
pub struct AgentBuilder {
    config: HybridConfig,
    client: Option<BoxedClient>,
    generator: Option<BoxedGenerator>,
    filter: Option<Filter>,
    observer: Option<BoxedObserver>,
    behaviors: Vec<Behavior>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: HybridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn client(mut self, client: BoxedClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn generator(mut self, generator: BoxedGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Replaces the default filter, which drops the agent's own messages.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Routes behavior diagnostics to `observer` instead of `tracing`.
    pub fn observer(mut self, observer: BoxedObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn behaviors<I>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = Behavior>,
    {
        self.behaviors.extend(behaviors);
        self
    }

    /// Validates the configuration and assembles the agent.
    pub fn build(self) -> RuntimeResult<Agent> {
        validate_config(&self.config)?;
        let client = self
            .client
            .ok_or(RuntimeError::MissingCollaborator("client"))?;
        let generator = self
            .generator
            .ok_or(RuntimeError::MissingCollaborator("generator"))?;

        let mut processor = MessageProcessor::new(generator);
        if let Some(filter) = self.filter {
            processor = processor.with_filter(filter);
        }
        if let Some(observer) = self.observer {
            processor = processor.with_observer(observer);
        }
        processor.registry().write().register_all(self.behaviors);

        debug!(
            agent = %self.config.agent.name,
            behaviors = processor.registry().read().len(),
            "Agent built"
        );

        Ok(Agent {
            config: Arc::new(self.config),
            client,
            processor,
            event_seq: Arc::new(AtomicU64::new(0)),
        })
    }
}
