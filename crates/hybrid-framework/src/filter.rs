//! Filter predicates for inbound messages.
//!
//! A [`Filter`] decides whether a message enters the pipeline at all. Filters
//! are pure, synchronous and cheap to clone, so one filter value can be shared
//! by every message task.
//!
//! # Composition
//!
//! Atomic predicates live in [`filters`] and compose with the usual operators:
//!
//! ```rust,ignore
//! use hybrid_framework::filter::filters::*;
//!
//! // Text messages in DMs, or anything that mentions the bot.
//! let filter = (is_text() & is_dm()) | has_mention("@bot");
//!
//! // Never answer our own messages.
//! let filter = filter & !from_self();
//! ```
//!
//! For ad-hoc conditions use [`create_filter`], which hands the closure a
//! [`FilterHelpers`] bound to the current message:
//!
//! ```rust,ignore
//! let filter = create_filter(|f| f.is_text() && !f.from_self() && f.has_mention("gm"));
//! ```
//!
//! Every predicate is total: content it does not understand evaluates to
//! `false` rather than failing.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use hybrid_core::{
    AgentRuntime, BoxedClient, BoxedConversation, ConversationKind, DecodedMessage,
    MessageContent,
};

/// The message-bearing value a filter is evaluated against.
#[derive(Clone, Copy)]
pub struct FilterInput<'a> {
    pub message: &'a DecodedMessage,
    pub conversation: &'a BoxedConversation,
    pub client: &'a BoxedClient,
}

impl<'a> FilterInput<'a> {
    pub fn new(
        message: &'a DecodedMessage,
        conversation: &'a BoxedConversation,
        client: &'a BoxedClient,
    ) -> Self {
        Self {
            message,
            conversation,
            client,
        }
    }

    /// Borrows the parts of a runtime needed for filtering.
    pub fn from_runtime(runtime: &'a AgentRuntime) -> Self {
        Self::new(&runtime.message, &runtime.conversation, &runtime.client)
    }
}

impl fmt::Debug for FilterInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterInput")
            .field("message", &self.message.id)
            .field("conversation", &self.conversation.id())
            .finish()
    }
}

type PredicateFn = dyn Fn(&FilterInput<'_>) -> bool + Send + Sync;

/// A composable message predicate.
#[derive(Clone)]
pub struct Filter {
    predicate: Arc<PredicateFn>,
}

impl Filter {
    /// Wraps a closure as a filter.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&FilterInput<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(f),
        }
    }

    /// A filter that accepts every message.
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// A filter that rejects every message.
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn evaluate(&self, input: &FilterInput<'_>) -> bool {
        (self.predicate)(input)
    }

    /// Evaluates the filter against a runtime's message.
    pub fn matches(&self, runtime: &AgentRuntime) -> bool {
        self.evaluate(&FilterInput::from_runtime(runtime))
    }

    pub fn and(self, other: Filter) -> Filter {
        Filter::new(move |input| self.evaluate(input) && other.evaluate(input))
    }

    pub fn or(self, other: Filter) -> Filter {
        Filter::new(move |input| self.evaluate(input) || other.evaluate(input))
    }

    pub fn negate(self) -> Filter {
        Filter::new(move |input| !self.evaluate(input))
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::always()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        self.negate()
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        self.and(rhs)
    }
}

impl BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        self.or(rhs)
    }
}

// ============================================================================
// Atomic predicates
// ============================================================================

/// Built-in predicates and combinators.
pub mod filters {
    use super::*;

    /// Text content, including text wrapped in a reply.
    pub fn is_text() -> Filter {
        Filter::new(|input| input.message.text().is_some())
    }

    /// Plain text content only; replies do not match.
    pub fn is_text_only() -> Filter {
        Filter::new(|input| matches!(input.message.content, MessageContent::Text { .. }))
    }

    pub fn is_dm() -> Filter {
        Filter::new(|input| input.conversation.kind() == ConversationKind::Dm)
    }

    pub fn is_group() -> Filter {
        Filter::new(|input| input.conversation.kind() == ConversationKind::Group)
    }

    pub fn is_reply() -> Filter {
        Filter::new(|input| matches!(input.message.content, MessageContent::Reply { .. }))
    }

    /// Reaction content, optionally restricted to one emoji.
    pub fn is_reaction(emoji: Option<&str>) -> Filter {
        let emoji = emoji.map(str::to_owned);
        Filter::new(move |input| reaction_matches(input.message, emoji.as_deref()))
    }

    /// Text that contains `pattern`, ignoring case.
    ///
    /// A pattern starting with `@` also matches the bare name.
    pub fn has_mention(pattern: impl Into<String>) -> Filter {
        let pattern = pattern.into();
        Filter::new(move |input| mentions(input.message, &pattern))
    }

    /// Messages sent by the agent itself.
    pub fn from_self() -> Filter {
        Filter::new(|input| input.message.sender_inbox_id == input.client.inbox_id())
    }

    pub fn from_sender(inbox_id: impl Into<String>) -> Filter {
        let inbox_id = inbox_id.into();
        Filter::new(move |input| input.message.sender_inbox_id == inbox_id)
    }

    pub fn not(filter: Filter) -> Filter {
        !filter
    }

    /// Matches when every filter matches. An empty set matches everything.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Filter {
        let filters: Vec<Filter> = filters.into_iter().collect();
        Filter::new(move |input| filters.iter().all(|f| f.evaluate(input)))
    }

    /// Matches when any filter matches. An empty set matches nothing.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Filter {
        let filters: Vec<Filter> = filters.into_iter().collect();
        Filter::new(move |input| filters.iter().any(|f| f.evaluate(input)))
    }
}

fn reaction_matches(message: &DecodedMessage, emoji: Option<&str>) -> bool {
    match (message.content.as_reaction(), emoji) {
        (Some(reaction), Some(emoji)) => reaction.content == emoji,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn mentions(message: &DecodedMessage, pattern: &str) -> bool {
    let Some(text) = message.text() else {
        return false;
    };
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    if pattern.is_empty() {
        return false;
    }
    if text.contains(&pattern) {
        return true;
    }
    match pattern.strip_prefix('@') {
        Some(bare) if !bare.is_empty() => text.contains(bare),
        _ => false,
    }
}

// ============================================================================
// Builder surface
// ============================================================================

/// Predicates bound to one message, for use inside [`create_filter`].
#[derive(Debug, Clone, Copy)]
pub struct FilterHelpers<'a> {
    input: &'a FilterInput<'a>,
}

impl<'a> FilterHelpers<'a> {
    pub fn new(input: &'a FilterInput<'a>) -> Self {
        Self { input }
    }

    pub fn message(&self) -> &DecodedMessage {
        self.input.message
    }

    pub fn is_text(&self) -> bool {
        self.input.message.text().is_some()
    }

    pub fn is_text_only(&self) -> bool {
        matches!(self.input.message.content, MessageContent::Text { .. })
    }

    pub fn is_dm(&self) -> bool {
        self.input.conversation.kind() == ConversationKind::Dm
    }

    pub fn is_group(&self) -> bool {
        self.input.conversation.kind() == ConversationKind::Group
    }

    pub fn is_reply(&self) -> bool {
        matches!(self.input.message.content, MessageContent::Reply { .. })
    }

    pub fn is_reaction(&self, emoji: Option<&str>) -> bool {
        reaction_matches(self.input.message, emoji)
    }

    pub fn has_mention(&self, pattern: &str) -> bool {
        mentions(self.input.message, pattern)
    }

    pub fn from_self(&self) -> bool {
        self.input.message.sender_inbox_id == self.input.client.inbox_id()
    }

    pub fn from_sender(&self, inbox_id: &str) -> bool {
        self.input.message.sender_inbox_id == inbox_id
    }
}

/// Builds a filter from a closure over [`FilterHelpers`].
pub fn create_filter<F>(f: F) -> Filter
where
    F: for<'a> Fn(&FilterHelpers<'a>) -> bool + Send + Sync + 'static,
{
    Filter::new(move |input| f(&FilterHelpers::new(input)))
}
