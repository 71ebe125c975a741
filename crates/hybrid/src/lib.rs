//! # Hybrid
//!
//! Messaging agents whose replies are shaped by a chain of behaviors, with an
//! HTTP ingress that turns external events into messages.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌───────────┐
//!   message ────────▶│  filter   │── rejected ──▶ (dropped)
//!                    └─────┬─────┘
//!                          ▼
//!                ┌───────────────────┐
//!                │ before behaviors  │── filtered ──▶ (vetoed)
//!                └─────────┬─────────┘
//!                          ▼
//!                    ┌───────────┐
//!                    │ generator │
//!                    └─────┬─────┘
//!                          ▼
//!                ┌───────────────────┐
//!                │  after behaviors  │── filtered ──▶ (vetoed)
//!                └─────────┬─────────┘
//!                          ▼
//!                     conversation
//!
//!   forwarder ──POST /blockchain-event──▶ Agent ──▶ synthetic message ──▶ filter ...
//! ```
//!
//! - **Core** ([`core`]): messages, events, and the client/conversation traits
//! - **Framework** ([`framework`]): behaviors, the execution chain, filters and the processor
//! - **Transport** ([`transport`]): the event forwarder and the ingress server
//! - **Runtime** ([`runtime`]): the [`Agent`](runtime::Agent), configuration and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hybrid::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RuntimeError> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let agent = Agent::builder()
//!         .config(config)
//!         .client(Arc::new(MyClient::connect().await?))
//!         .generator(Arc::new(MyModel::default()))
//!         .behavior(rate_limit(RateLimitConfig::default())?)
//!         .behavior(react_with("👀", ReactWithConfig::default()))
//!         .behavior(threaded_reply(ThreadedReplyConfig::default()))
//!         .build()?;
//!
//!     agent.run().await
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `hybrid.toml`
//! - `yaml-config`: load `hybrid.yaml`
//! - `json-log`: JSON log output

pub use hybrid_core as core;
pub use hybrid_framework as framework;
pub use hybrid_runtime as runtime;
pub use hybrid_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use hybrid::prelude::*;
/// ```
pub mod prelude {
    pub use hybrid_runtime::prelude::*;

    pub use hybrid_framework::{BehaviorBuilder, BehaviorConfig, Phase, SendOptions, hook_fn};
    pub use hybrid_transport::{EventForwarder, ForwarderConfig};
}
