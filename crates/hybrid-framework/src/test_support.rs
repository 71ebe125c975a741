//! In-memory collaborators for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use hybrid_core::{
    AgentRuntime, BoxedConversation, Client, ClientError, ClientResult, Conversation,
    ConversationKind, DecodedMessage, MessageContent, OutgoingMessage, Sender,
};

pub(crate) const AGENT_INBOX: &str = "agent-inbox";
pub(crate) const AGENT_ADDRESS: &str = "0xagent";
pub(crate) const USER_INBOX: &str = "user-inbox";

/// Conversation that records every message sent into it.
pub(crate) struct RecordingConversation {
    id: String,
    kind: ConversationKind,
    pub(crate) sent: Mutex<Vec<OutgoingMessage>>,
    fail_sends: bool,
}

impl RecordingConversation {
    pub(crate) fn new(kind: ConversationKind) -> Self {
        Self {
            id: "conv-1".to_string(),
            kind,
            sent: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    pub(crate) fn failing(kind: ConversationKind) -> Self {
        Self {
            fail_sends: true,
            ..Self::new(kind)
        }
    }
}

#[async_trait]
impl Conversation for RecordingConversation {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ConversationKind {
        self.kind
    }

    async fn send(&self, message: OutgoingMessage) -> ClientResult<String> {
        if self.fail_sends {
            return Err(ClientError::SendFailed("network down".into()));
        }
        let mut sent = self.sent.lock();
        sent.push(message);
        Ok(format!("sent-{}", sent.len()))
    }
}

pub(crate) struct StaticClient;

#[async_trait]
impl Client for StaticClient {
    fn inbox_id(&self) -> &str {
        AGENT_INBOX
    }

    fn address(&self) -> Option<&str> {
        Some(AGENT_ADDRESS)
    }

    async fn conversation(&self, _id: &str) -> ClientResult<Option<BoxedConversation>> {
        Ok(None)
    }
}

pub(crate) fn text_message(text: &str) -> DecodedMessage {
    DecodedMessage::new("msg-1", "conv-1", USER_INBOX, MessageContent::text(text))
}

pub(crate) fn runtime_in(
    conversation: Arc<RecordingConversation>,
    message: DecodedMessage,
) -> AgentRuntime {
    let sender = Sender::new(message.sender_inbox_id.clone());
    AgentRuntime::new(conversation, message, sender, Arc::new(StaticClient))
}

pub(crate) fn runtime(message: DecodedMessage) -> AgentRuntime {
    runtime_in(
        Arc::new(RecordingConversation::new(ConversationKind::Group)),
        message,
    )
}
