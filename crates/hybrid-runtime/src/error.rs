//! Runtime error types.

use thiserror::Error;

use hybrid_framework::BehaviorError;
use hybrid_transport::TransportError;

use crate::config::ConfigError;

/// Errors that can occur while assembling or running an agent.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A required collaborator was not supplied to the builder.
    #[error("Agent is missing a {0}")]
    MissingCollaborator(&'static str),

    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A behavior was configured incorrectly.
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// The ingress server or forwarder failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
