//! Error types for the behavior pipeline.

use thiserror::Error;

use hybrid_core::{ClientError, GenerationError};

/// Errors a behavior hook can report.
///
/// The execution chain never propagates these: they are handed to the
/// [`ChainObserver`](crate::chain::ChainObserver) together with the behavior
/// ID and the chain moves on.
#[derive(Debug, Clone, Error)]
pub enum BehaviorError {
    /// A call to the messaging client failed inside the hook.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A behavior was assembled with an invalid configuration.
    ///
    /// Raised at configuration time, never from inside a hook.
    #[error("invalid behavior configuration: {0}")]
    InvalidConfig(String),

    /// Custom hook error.
    #[error("{0}")]
    Custom(String),
}

impl BehaviorError {
    /// Creates a custom behavior error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Errors that abort processing of a single message.
///
/// Behavior failures are absent on purpose: they are absorbed by the chain.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The top-level filter panicked while evaluating the message.
    #[error("filter evaluation failed: {0}")]
    FilterPanicked(String),

    /// The model call failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Sending the response into the conversation failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] ClientError),
}

/// Result type for behavior hooks.
pub type BehaviorResult<T> = Result<T, BehaviorError>;

/// Result type for message processing.
pub type ProcessResult<T> = Result<T, ProcessError>;
