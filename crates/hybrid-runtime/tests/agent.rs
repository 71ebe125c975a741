//! Agents receiving forwarded events and running them through the pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use hybrid_core::{
    BoxedConversation, Client, ClientError, ClientResult, Conversation, ConversationKind, Event,
    GenerationError, GenerationResult, MessageContent, OutgoingContent, OutgoingMessage,
};
use hybrid_framework::behaviors::{
    RateLimitConfig, ThreadedReplyConfig, filter_messages_with, rate_limit, threaded_reply,
};
use hybrid_framework::{BehaviorContext, BoxedGenerator, Filter, Generator};
use hybrid_runtime::{Agent, CONVERSATION_ID_KEY, HybridConfig, RuntimeError, RuntimeResult};
use hybrid_transport::{
    EVENT_PATH, EventForwarder, EventHandler, EventServer, EventTransport, ForwarderConfig,
    ReqwestTransport,
};

struct ChannelConversation {
    id: String,
    outbox: mpsc::UnboundedSender<OutgoingMessage>,
}

#[async_trait]
impl Conversation for ChannelConversation {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ConversationKind {
        ConversationKind::Dm
    }

    async fn send(&self, message: OutgoingMessage) -> ClientResult<String> {
        self.outbox
            .send(message)
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;
        Ok("sent".into())
    }
}

struct DirectoryClient {
    conversations: HashMap<String, BoxedConversation>,
}

#[async_trait]
impl Client for DirectoryClient {
    fn inbox_id(&self) -> &str {
        "agent-inbox"
    }

    async fn conversation(&self, id: &str) -> ClientResult<Option<BoxedConversation>> {
        if id == "broken" {
            return Err(ClientError::Other("directory offline".into()));
        }
        Ok(self.conversations.get(id).cloned())
    }
}

struct EventSummarizer;

#[async_trait]
impl Generator for EventSummarizer {
    async fn generate(&self, ctx: &BehaviorContext) -> GenerationResult<String> {
        match &ctx.message().content {
            MessageContent::Event(event) => Ok(format!(
                "{} from {}",
                event.event_type,
                event.str_field("from").unwrap_or("someone")
            )),
            other => Ok(format!("unexpected {other}")),
        }
    }
}

struct ProviderDown;

#[async_trait]
impl Generator for ProviderDown {
    async fn generate(&self, _ctx: &BehaviorContext) -> GenerationResult<String> {
        Err(GenerationError::Provider("model unavailable".into()))
    }
}

fn agent() -> (Agent, mpsc::UnboundedReceiver<OutgoingMessage>) {
    agent_with(Arc::new(EventSummarizer))
}

fn agent_with(generator: BoxedGenerator) -> (Agent, mpsc::UnboundedReceiver<OutgoingMessage>) {
    let (outbox, inbox) = mpsc::unbounded_channel();
    let conversation: BoxedConversation = Arc::new(ChannelConversation {
        id: "conv-events".into(),
        outbox,
    });
    let client = DirectoryClient {
        conversations: HashMap::from([("conv-events".to_string(), conversation)]),
    };

    let agent = Agent::builder()
        .client(Arc::new(client))
        .generator(generator)
        .build()
        .unwrap();
    (agent, inbox)
}

async fn next_text(inbox: &mut mpsc::UnboundedReceiver<OutgoingMessage>) -> OutgoingMessage {
    tokio::time::timeout(Duration::from_secs(5), inbox.recv())
        .await
        .expect("no message sent in time")
        .expect("outbox closed")
}

fn text_of(message: &OutgoingMessage) -> &str {
    match &message.content {
        OutgoingContent::Text { text } => text,
        other => panic!("expected text, got {other:?}"),
    }
}

fn transfer() -> Event {
    Event::new("transfer")
        .with(CONVERSATION_ID_KEY, "conv-events")
        .with("from", "0xabc")
}

#[test]
fn test_builder_reports_missing_generator() {
    let client = DirectoryClient {
        conversations: HashMap::new(),
    };
    let err = Agent::builder()
        .client(Arc::new(client))
        .build()
        .unwrap_err();
    assert!(matches!(err, RuntimeError::MissingCollaborator("generator")));
}

#[tokio::test]
async fn test_event_is_answered_in_its_conversation() {
    let (agent, mut inbox) = agent();

    let body = agent.handle_event(transfer()).await.unwrap();
    assert!(body.contains("transfer"));

    let sent = next_text(&mut inbox).await;
    assert_eq!(text_of(&sent), "transfer from 0xabc");
    assert!(!sent.is_threaded());
}

#[tokio::test]
async fn test_threaded_reply_references_synthetic_message() {
    let (agent, mut inbox) = agent();
    agent.use_behaviors([threaded_reply(ThreadedReplyConfig::default())]);

    agent.handle_event(transfer()).await.unwrap();

    let sent = next_text(&mut inbox).await;
    let reference = sent.reply_to.as_deref().unwrap();
    assert!(reference.starts_with("event-"));
}

#[tokio::test]
async fn test_event_rejections_map_to_statuses() {
    let (agent, _inbox) = agent();

    let missing = agent.handle_event(Event::new("transfer")).await.unwrap_err();
    assert_eq!(missing.status, 400);

    let unknown = agent
        .handle_event(Event::new("transfer").with(CONVERSATION_ID_KEY, "elsewhere"))
        .await
        .unwrap_err();
    assert_eq!(unknown.status, 404);

    let broken = agent
        .handle_event(Event::new("transfer").with(CONVERSATION_ID_KEY, "broken"))
        .await
        .unwrap_err();
    assert_eq!(broken.status, 500);
}

#[tokio::test]
async fn test_forwarded_event_reaches_conversation() {
    let (agent, mut inbox) = agent();
    let server = EventServer::bind("127.0.0.1:0").await.unwrap();
    let agent_url = format!("http://{}", server.local_addr());
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let agent = agent.clone();
        let shutdown = shutdown.clone();
        async move { agent.serve_with(server, shutdown).await }
    });

    let forwarder = EventForwarder::new(ForwarderConfig::new(agent_url)).unwrap();
    assert!(forwarder.forward_event(&transfer()).await);

    let sent = next_text(&mut inbox).await;
    assert_eq!(text_of(&sent), "transfer from 0xabc");

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[test]
fn test_forwarder_follows_config() {
    let (agent, _inbox) = agent();
    let forwarder = agent.forwarder().unwrap();
    assert_eq!(forwarder.config(), &HybridConfig::default().forwarder);
}

#[tokio::test]
async fn test_generation_failure_answers_server_error() {
    let (agent, mut inbox) = agent_with(Arc::new(ProviderDown));
    let server = EventServer::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}{EVENT_PATH}", server.local_addr());
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let agent = agent.clone();
        let shutdown = shutdown.clone();
        async move { agent.serve_with(server, shutdown).await }
    });

    let status = ReqwestTransport::new()
        .unwrap()
        .post_event(&url, None, &transfer())
        .await
        .unwrap();
    assert_eq!(status, 500);
    assert!(inbox.try_recv().is_err());

    shutdown.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_vetoed_event_is_still_accepted() {
    let (agent, mut inbox) = agent();
    agent.use_behaviors([filter_messages_with(Filter::never())]);

    let body = agent.handle_event(transfer()).await.unwrap();
    assert!(body.contains("transfer"));
    assert!(inbox.try_recv().is_err());
}

fn rate_limited_agent(config: RateLimitConfig) -> RuntimeResult<Agent> {
    let client = DirectoryClient {
        conversations: HashMap::new(),
    };
    let agent = Agent::builder()
        .client(Arc::new(client))
        .generator(Arc::new(EventSummarizer))
        .behavior(rate_limit(config)?)
        .build()?;
    Ok(agent)
}

#[test]
fn test_invalid_behavior_config_fails_assembly() {
    let err = rate_limited_agent(RateLimitConfig {
        max_messages: 0,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, RuntimeError::Behavior(_)));

    assert!(rate_limited_agent(RateLimitConfig::default()).is_ok());
}
