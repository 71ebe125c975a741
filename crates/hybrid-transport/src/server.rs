//! Event ingress server.
//!
//! Exposes the two endpoints the forwarder contract relies on:
//!
//! ```text
//! POST /blockchain-event  → EventHandler::handle_event
//! GET  /health            → { "status": "ok" }
//! ```
//!
//! | Situation | Status | Body |
//! |-----------|--------|------|
//! | Body is not a valid event | 400 | `{ "error": ... }` |
//! | Handler rejected the event | 4xx from the rejection | `{ "error": ... }` |
//! | Handler failed internally | 500 | `{ "error": ... }` |
//! | Handler accepted the event | 200 | `{ "success": true, "message": ... }` |
//!
//! The server runs until its [`CancellationToken`] is cancelled, then stops
//! accepting connections and lets in-flight requests finish.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hybrid_core::Event;

use crate::error::{TransportError, TransportResult};
use crate::forwarder::EVENT_PATH;

pub const HEALTH_PATH: &str = "/health";

// ============================================================================
// Handler seam
// ============================================================================

/// Why an event was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EventRejection {
    pub status: u16,
    pub message: String,
}

impl EventRejection {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// The handler itself failed; reported as 500.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Receives events posted to the ingress endpoint.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Accepts an event and returns a short confirmation message.
    async fn handle_event(&self, event: Event) -> Result<String, EventRejection>;
}

/// Shared handle to an event handler.
pub type BoxedEventHandler = Arc<dyn EventHandler>;

// ============================================================================
// Router
// ============================================================================

/// Builds the ingress router around `handler`.
pub fn router(handler: BoxedEventHandler) -> Router {
    Router::new()
        .route(EVENT_PATH, post(receive_event))
        .route(HEALTH_PATH, get(health))
        .with_state(handler)
}

async fn receive_event(State(handler): State<BoxedEventHandler>, body: Bytes) -> Response {
    let event: Event = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, len = body.len(), "Rejected malformed event payload");
            return error_response(StatusCode::BAD_REQUEST, format!("invalid event payload: {e}"));
        }
    };

    let event_type = event.event_type.clone();
    match handler.handle_event(event).await {
        Ok(message) => {
            debug!(event = %event_type, "Event accepted");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "message": message })),
            )
                .into_response()
        }
        Err(rejection) => {
            let status = rejection.status_code();
            if status.is_server_error() {
                error!(event = %event_type, error = %rejection, "Event handler failed");
            } else {
                warn!(
                    event = %event_type,
                    status = status.as_u16(),
                    error = %rejection,
                    "Event rejected"
                );
            }
            error_response(status, rejection.message)
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// ============================================================================
// Server lifecycle
// ============================================================================

/// A bound, not yet serving, ingress listener.
#[derive(Debug)]
pub struct EventServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl EventServer {
    /// Binds `addr`. Port 0 picks a free port; see [`local_addr`](Self::local_addr).
    pub async fn bind(addr: &str) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves requests until `shutdown` is cancelled.
    pub async fn serve(
        self,
        handler: BoxedEventHandler,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        info!(addr = %self.local_addr, "Event server listening");

        axum::serve(self.listener, router(handler))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!(addr = %self.local_addr, "Event server stopped");
        Ok(())
    }
}

/// Binds `addr` and serves until `shutdown` is cancelled.
pub async fn serve(
    addr: &str,
    handler: BoxedEventHandler,
    shutdown: CancellationToken,
) -> TransportResult<()> {
    EventServer::bind(addr).await?.serve(handler, shutdown).await
}
