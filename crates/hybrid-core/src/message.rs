//! Message types for the Hybrid runtime.
//!
//! Inbound messages arrive from the messaging network already decoded into a
//! [`DecodedMessage`]. Each carries a [`MessageContent`] whose variant decides
//! which filter predicates match it. Outbound traffic is described by an
//! [`OutgoingMessage`], which the conversation collaborator turns into
//! whatever wire format the network speaks.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::event::Event;

/// Content type identifiers understood by the pipeline.
pub mod content_types {
    /// Plain text.
    pub const TEXT: &str = "xmtp.org/text:1.0";
    /// Emoji reaction to another message.
    pub const REACTION: &str = "xmtp.org/reaction:1.0";
    /// Threaded reply to another message.
    pub const REPLY: &str = "xmtp.org/reply:1.0";
    /// Synthetic message produced from a forwarded external event.
    pub const EVENT: &str = "hybrid/event:1.0";
}

// ============================================================================
// Reactions
// ============================================================================

/// Whether a reaction was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    #[default]
    Added,
    Removed,
}

/// How the reaction content should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionSchema {
    /// A literal unicode emoji, e.g. `👍`.
    #[default]
    Unicode,
    /// A shortcode such as `:thumbsup:`.
    Shortcode,
    /// Application-defined content.
    Custom,
}

/// A reaction to a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// ID of the message being reacted to.
    pub reference: String,
    #[serde(default)]
    pub action: ReactionAction,
    #[serde(default)]
    pub schema: ReactionSchema,
    /// The emoji (or shortcode / custom payload).
    pub content: String,
}

impl Reaction {
    /// Creates an "added" unicode reaction to `reference`.
    pub fn unicode(reference: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            action: ReactionAction::Added,
            schema: ReactionSchema::Unicode,
            content: emoji.into(),
        }
    }
}

// ============================================================================
// Inbound content
// ============================================================================

/// Decoded content of an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text.
    Text { text: String },
    /// A reaction to another message.
    Reaction(Reaction),
    /// A reply to another message, wrapping the inner content.
    Reply {
        reference: String,
        content: Box<MessageContent>,
    },
    /// A synthetic message built from a forwarded external event.
    Event(Event),
    /// Content of a type the pipeline does not decode.
    Unknown {
        content_type: String,
        #[serde(default)]
        payload: Value,
    },
}

impl MessageContent {
    /// Creates a text content value.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the content type identifier of this content.
    pub fn content_type(&self) -> &str {
        match self {
            Self::Text { .. } => content_types::TEXT,
            Self::Reaction(_) => content_types::REACTION,
            Self::Reply { .. } => content_types::REPLY,
            Self::Event(_) => content_types::EVENT,
            Self::Unknown { content_type, .. } => content_type,
        }
    }

    /// Returns the text body, looking through replies.
    ///
    /// Non-text content yields `None`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Reply { content, .. } => content.as_text(),
            _ => None,
        }
    }

    /// Returns the reaction, if this content is one.
    pub fn as_reaction(&self) -> Option<&Reaction> {
        match self {
            Self::Reaction(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { text } => write!(f, "{text}"),
            Self::Reaction(r) => write!(f, "[reaction {} to {}]", r.content, r.reference),
            Self::Reply { content, .. } => write!(f, "{content}"),
            Self::Event(e) => write!(f, "[event {}]", e.event_type),
            Self::Unknown { content_type, .. } => write!(f, "[{content_type}]"),
        }
    }
}

/// A message received from the messaging network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_inbox_id: String,
    /// Sent timestamp in nanoseconds since the Unix epoch.
    #[serde(default)]
    pub sent_at_ns: i64,
    pub content: MessageContent,
}

impl DecodedMessage {
    /// Creates a message with a zero timestamp.
    pub fn new(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        sender_inbox_id: impl Into<String>,
        content: MessageContent,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sender_inbox_id: sender_inbox_id.into(),
            sent_at_ns: 0,
            content,
        }
    }

    /// Builds the synthetic message that carries a forwarded event into the pipeline.
    ///
    /// The sender inbox ID is `event:<type>` so filters can tell event
    /// traffic apart from real participants.
    pub fn from_event(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        event: Event,
    ) -> Self {
        let sender = format!("event:{}", event.event_type);
        Self::new(id, conversation_id, sender, MessageContent::Event(event))
    }

    /// Returns the content type identifier of the message content.
    pub fn content_type(&self) -> &str {
        self.content.content_type()
    }

    /// Returns the text body if the message carries text.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }
}

// ============================================================================
// Outbound messages
// ============================================================================

/// The body of a message the agent sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingContent {
    Text { text: String },
    Reaction(Reaction),
}

/// A message ready for dispatch through a [`Conversation`](crate::Conversation).
///
/// Implementations must honour `reply_to` by replying inside the referenced
/// message's thread rather than posting a top-level message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub content: OutgoingContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl OutgoingMessage {
    /// Creates a top-level text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: OutgoingContent::Text { text: text.into() },
            content_type: None,
            reply_to: None,
            metadata: None,
        }
    }

    /// Creates a reaction message.
    pub fn reaction(reaction: Reaction) -> Self {
        Self {
            content: OutgoingContent::Reaction(reaction),
            content_type: Some(content_types::REACTION.to_string()),
            reply_to: None,
            metadata: None,
        }
    }

    /// Marks this message as a threaded reply to `message_id`.
    pub fn in_reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }

    /// Returns `true` if this message should be delivered into a thread.
    pub fn is_threaded(&self) -> bool {
        self.reply_to.is_some()
    }
}
