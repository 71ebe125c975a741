//! # Hybrid Core
//!
//! The data model and collaborator traits shared by every Hybrid crate.
//!
//! - **Messages**: decoded inbound content ([`DecodedMessage`], [`MessageContent`])
//!   and outbound dispatch payloads ([`OutgoingMessage`])
//! - **Runtime objects**: the [`Conversation`] and [`Client`] traits implemented
//!   by the messaging-network integration, bundled per message as [`AgentRuntime`]
//! - **Events**: externally-sourced [`Event`]s carried by the forwarder
//! - **Errors**: collaborator failures ([`ClientError`], [`GenerationError`])
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Messaging   │────▶│ AgentRuntime │────▶│   Pipeline   │
//! │   network    │     │  (per msg)   │     │ (framework)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod error;
pub mod event;
pub mod message;
pub mod runtime;

pub use error::{ClientError, ClientResult, GenerationError, GenerationResult};
pub use event::Event;
pub use message::{
    DecodedMessage, MessageContent, OutgoingContent, OutgoingMessage, Reaction, ReactionAction,
    ReactionSchema, content_types,
};
pub use runtime::{
    AgentRuntime, BoxedClient, BoxedConversation, Client, Conversation, ConversationKind, Sender,
};
