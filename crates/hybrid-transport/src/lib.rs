//! # Hybrid Transport
//!
//! Network transports that feed external events into a Hybrid agent.
//!
//! ## Features
//!
//! - `http-client` (default): [`ReqwestTransport`] for the event forwarder
//! - `http-server` (default): the axum-based event ingress [`server`]
//! - `full`: everything
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  POST /blockchain-event  ┌──────────────────┐
//! │  EventForwarder  │ ───────────────────────▶ │   Event server   │
//! │ (retry, backoff) │                          │  (EventHandler)  │
//! └──────────────────┘                          └──────────────────┘
//!                                                        │
//!                                                        ▼
//!                                               agent pipeline
//! ```
//!
//! The forwarder talks to the network through the [`EventTransport`] trait,
//! so its retry policy can be exercised without sockets.

pub mod error;
pub mod forwarder;

#[cfg(feature = "http-server")]
pub mod server;

pub use error::{TransportError, TransportResult};
pub use forwarder::{
    BackoffPolicy, BoxedEventTransport, EVENT_PATH, EventForwarder, EventTransport,
    ForwarderConfig,
};

#[cfg(feature = "http-client")]
pub use forwarder::ReqwestTransport;

#[cfg(feature = "http-server")]
pub use server::{BoxedEventHandler, EventHandler, EventRejection, EventServer, serve};
