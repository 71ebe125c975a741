//! Hybrid Runtime - assembles and runs agents.
//!
//! This crate provides:
//! - The [`Agent`] handle and its [`AgentBuilder`]
//! - Layered configuration ([`config`])
//! - Logging setup ([`logging`])
//! - The event ingress binding (`Agent` implements
//!   [`EventHandler`](hybrid_transport::EventHandler))
//!
//! ```rust,ignore
//! use hybrid_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let agent = Agent::builder()
//!         .config(config)
//!         .client(client)
//!         .generator(generator)
//!         .behavior(threaded_reply(ThreadedReplyConfig::default()))
//!         .build()?;
//!
//!     agent.run().await
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;

pub use agent::{Agent, AgentBuilder, CONVERSATION_ID_KEY};
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, HybridConfig, Profile, load_config,
    load_config_from_file,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for downstream crates
pub use tracing;
pub use tracing_subscriber;

/// Commonly used items for building an agent.
pub mod prelude {
    pub use crate::agent::{Agent, AgentBuilder};
    pub use crate::config::{ConfigLoader, HybridConfig, load_config};
    pub use crate::error::{RuntimeError, RuntimeResult};
    pub use crate::logging;

    pub use hybrid_core::{AgentRuntime, Client, Conversation, DecodedMessage, Event};
    pub use hybrid_framework::behaviors::*;
    pub use hybrid_framework::{
        Behavior, BehaviorContext, Filter, Flow, Generator, MessageProcessor, ProcessOutcome,
        create_filter, filters, generator_fn,
    };

    pub use std::sync::Arc;
    pub use tracing::{debug, error, info, trace, warn};
}
