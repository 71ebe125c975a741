//! Per-message context for the behavior pipeline.
//!
//! A [`BehaviorContext`] is created fresh for every inbound message and is
//! owned by the task processing that message. Behaviors receive it as
//! `&mut BehaviorContext` for the duration of one hook call and cannot keep
//! it afterwards; the borrow checker enforces what would otherwise be a
//! convention.
//!
//! The context accumulates [`SendOptions`] across both phases. Fields are
//! last-write-wins and nothing clears them implicitly, so a before-hook's
//! choice survives into dispatch unless a later hook overwrites it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hybrid_core::{AgentRuntime, BoxedClient, BoxedConversation, DecodedMessage, Sender};

// =============================================================================
// SendOptions
// =============================================================================

/// Mutable delivery controls produced by behaviors and consumed at dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// Reply inside the inbound message's thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threaded: Option<bool>,

    /// Content type hint for the outgoing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Set by a behavior to veto processing of this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered: Option<bool>,

    /// Arbitrary metadata forwarded to the conversation on dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl SendOptions {
    /// Returns `true` if a behavior vetoed the message.
    pub fn is_filtered(&self) -> bool {
        self.filtered == Some(true)
    }

    /// Returns `true` if the response should be threaded.
    pub fn is_threaded(&self) -> bool {
        self.threaded == Some(true)
    }

    /// Inserts a metadata entry, creating the map on first use.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
    }
}

// =============================================================================
// BehaviorContext
// =============================================================================

/// The mutable, per-message state shared by every hook in both phases.
#[derive(Debug)]
pub struct BehaviorContext {
    runtime: AgentRuntime,
    /// Delivery options accumulated by behaviors.
    pub send_options: SendOptions,
    /// The generated response, available to after-hooks.
    pub response: Option<String>,
    /// Set by the chain when the last phase ended before every behavior ran.
    pub stopped: bool,
}

impl BehaviorContext {
    /// Creates a fresh context with empty send options.
    pub fn new(runtime: AgentRuntime) -> Self {
        Self {
            runtime,
            send_options: SendOptions::default(),
            response: None,
            stopped: false,
        }
    }

    /// Returns the runtime objects for this message.
    pub fn runtime(&self) -> &AgentRuntime {
        &self.runtime
    }

    /// Returns the conversation the message arrived in.
    pub fn conversation(&self) -> &BoxedConversation {
        &self.runtime.conversation
    }

    /// Returns the inbound message.
    pub fn message(&self) -> &DecodedMessage {
        &self.runtime.message
    }

    /// Returns the message's sender.
    pub fn sender(&self) -> &Sender {
        &self.runtime.sender
    }

    /// Returns the agent's client.
    pub fn client(&self) -> &BoxedClient {
        &self.runtime.client
    }
}
