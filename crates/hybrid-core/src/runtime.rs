//! Messaging-network collaborators.
//!
//! The pipeline never talks to the network directly. The messaging client
//! hands it an [`AgentRuntime`] per inbound message: the conversation the
//! message arrived in, the decoded message, who sent it, and the client
//! itself. Implementations of [`Conversation`] and [`Client`] live with the
//! network integration; tests use in-memory fakes.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;
use crate::message::{DecodedMessage, OutgoingMessage};

/// Whether a conversation is a one-to-one DM or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Dm,
    Group,
}

/// A conversation the agent can send into.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Returns the conversation ID.
    fn id(&self) -> &str;

    /// Returns whether this is a DM or a group.
    fn kind(&self) -> ConversationKind;

    /// Sends a message and returns the ID assigned to it.
    ///
    /// A message with `reply_to` set must be delivered into that message's thread.
    async fn send(&self, message: OutgoingMessage) -> ClientResult<String>;
}

/// Shared handle to a conversation.
pub type BoxedConversation = Arc<dyn Conversation>;

/// The agent's own messaging-network client.
#[async_trait]
pub trait Client: Send + Sync {
    /// The agent's inbox ID.
    fn inbox_id(&self) -> &str;

    /// The agent's account address, if the network exposes one.
    fn address(&self) -> Option<&str> {
        None
    }

    /// Looks up a conversation by ID.
    async fn conversation(&self, id: &str) -> ClientResult<Option<BoxedConversation>>;
}

/// Shared handle to the client.
pub type BoxedClient = Arc<dyn Client>;

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub inbox_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Sender {
    /// Creates a sender with no known address.
    pub fn new(inbox_id: impl Into<String>) -> Self {
        Self {
            inbox_id: inbox_id.into(),
            address: None,
        }
    }

    /// Sets the sender's address (builder pattern).
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// The runtime objects supplied for one inbound message.
#[derive(Clone)]
pub struct AgentRuntime {
    pub conversation: BoxedConversation,
    pub message: DecodedMessage,
    pub sender: Sender,
    pub client: BoxedClient,
}

impl AgentRuntime {
    pub fn new(
        conversation: BoxedConversation,
        message: DecodedMessage,
        sender: Sender,
        client: BoxedClient,
    ) -> Self {
        Self {
            conversation,
            message,
            sender,
            client,
        }
    }

    /// Returns `true` if the message was sent by the agent itself.
    pub fn is_from_self(&self) -> bool {
        self.message.sender_inbox_id == self.client.inbox_id()
    }
}

impl fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("conversation", &self.conversation.id())
            .field("message", &self.message.id)
            .field("sender", &self.sender.inbox_id)
            .field("client", &self.client.inbox_id())
            .finish()
    }
}
