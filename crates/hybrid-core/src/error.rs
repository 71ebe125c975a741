//! Unified error types for the Hybrid core.
//!
//! These errors describe failures of the external collaborators the pipeline
//! talks to. Pipeline-level errors (behavior failures, processing failures)
//! are defined in `hybrid-framework`.

use thiserror::Error;

// =============================================================================
// Client Errors
// =============================================================================

/// Errors raised by the messaging-network client or a conversation handle.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The client is not connected to the messaging network.
    #[error("client is not connected")]
    NotConnected,

    /// Sending a message into a conversation failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The referenced conversation is unknown to the client.
    #[error("conversation '{id}' not found")]
    ConversationNotFound {
        /// The missing conversation ID.
        id: String,
    },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Generation Errors
// =============================================================================

/// Errors raised by the language-model generation capability.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The model provider returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The model call timed out.
    #[error("generation timed out")]
    Timeout,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;
