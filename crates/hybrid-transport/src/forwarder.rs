//! Retrying event forwarder.
//!
//! [`EventForwarder`] delivers [`Event`]s to an agent's ingress endpoint
//! (`POST <agent_url>/blockchain-event`). Delivery is best effort: the caller
//! gets a plain `bool` and every failure is logged instead of returned.
//!
//! # Retry policy
//!
//! | Outcome | Action |
//! |---------|--------|
//! | 2xx | Delivered, return `true` |
//! | 4xx | The agent refused the event, return `false` without retrying |
//! | 5xx, other status, network error, timeout | Retry after a backoff delay |
//!
//! At most `max(max_retries, 1)` attempts are made. The delay before attempt
//! `n + 1` is `min(initial * multiplier^(n - 1), max)`, i.e. 1s, 2s, 4s, 5s, ...
//! with the defaults. Delays use `tokio::time::sleep`, so waiting never blocks
//! a worker thread.
//!
//! ```rust,ignore
//! let forwarder = EventForwarder::new(
//!     ForwarderConfig::new("http://localhost:8454").with_api_key("secret"),
//! )?;
//! let delivered = forwarder
//!     .forward_event(&Event::new("transfer").with("conversationId", "abc"))
//!     .await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use hybrid_core::Event;

use crate::error::{TransportError, TransportResult};

/// Path of the ingress endpoint, relative to the agent URL.
pub const EVENT_PATH: &str = "/blockchain-event";

// ============================================================================
// Configuration
// ============================================================================

/// Where and how events are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Base URL of the agent, e.g. `http://localhost:8454`.
    pub agent_url: String,
    /// Sent as a bearer token when set.
    pub api_key: Option<String>,
    /// Maximum delivery attempts. Zero still makes one attempt.
    pub max_retries: u32,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            agent_url: "http://localhost:8454".to_string(),
            api_key: None,
            max_retries: 3,
            timeout_ms: 10_000,
        }
    }
}

impl ForwarderConfig {
    pub fn new(agent_url: impl Into<String>) -> Self {
        Self {
            agent_url: agent_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The full ingress URL; a trailing slash on the base is ignored.
    pub fn endpoint(&self) -> String {
        format!("{}{EVENT_PATH}", self.agent_url.trim_end_matches('/'))
    }

    /// Number of attempts actually made.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Exponential backoff schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(5000),
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait after the failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial
            .checked_mul(factor)
            .map_or(self.max, |d| d.min(self.max))
    }
}

// ============================================================================
// Transport seam
// ============================================================================

/// Sends one event over the wire and reports the HTTP status.
///
/// Network-level failures are errors; any HTTP answer, including 4xx and
/// 5xx, is `Ok(status)` so the forwarder can apply its policy.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn post_event(
        &self,
        url: &str,
        api_key: Option<&str>,
        event: &Event,
    ) -> TransportResult<u16>;
}

/// Shared handle to a transport.
pub type BoxedEventTransport = Arc<dyn EventTransport>;

/// [`EventTransport`] backed by `reqwest`.
#[cfg(feature = "http-client")]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http-client")]
impl ReqwestTransport {
    pub fn new() -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Uses an existing client, e.g. one with custom TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl EventTransport for ReqwestTransport {
    async fn post_event(
        &self,
        url: &str,
        api_key: Option<&str>,
        event: &Event,
    ) -> TransportResult<u16> {
        let mut req = self.client.post(url).json(event);
        if let Some(key) = api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(resp.status().as_u16())
    }
}

// ============================================================================
// EventForwarder
// ============================================================================

/// Delivers events to an agent with bounded retries.
#[derive(Clone)]
pub struct EventForwarder {
    config: ForwarderConfig,
    backoff: BackoffPolicy,
    transport: BoxedEventTransport,
}

impl EventForwarder {
    /// Creates a forwarder that uses [`ReqwestTransport`].
    #[cfg(feature = "http-client")]
    pub fn new(config: ForwarderConfig) -> TransportResult<Self> {
        Ok(Self::with_transport(
            config,
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    /// Creates a forwarder over a custom transport.
    pub fn with_transport(config: ForwarderConfig, transport: BoxedEventTransport) -> Self {
        Self {
            config,
            backoff: BackoffPolicy::default(),
            transport,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Delivers `event`, retrying transient failures.
    ///
    /// Returns `true` once the agent accepts the event and `false` when it
    /// rejects it or every attempt failed. Never returns an error.
    pub async fn forward_event(&self, event: &Event) -> bool {
        let url = self.config.endpoint();
        let attempts = self.config.attempts();
        let api_key = self.config.api_key.as_deref();

        for attempt in 1..=attempts {
            debug!(event = %event.event_type, url = %url, attempt, attempts, "Forwarding event");

            match self.deliver_once(&url, api_key, event).await {
                Ok(()) => {
                    info!(event = %event.event_type, attempt, "Event delivered");
                    return true;
                }
                Err(TransportError::Status(status)) if (400..500).contains(&status) => {
                    warn!(
                        event = %event.event_type,
                        status,
                        "Agent rejected event; not retrying"
                    );
                    return false;
                }
                Err(e) => {
                    warn!(event = %event.event_type, error = %e, attempt, "Event delivery failed");
                }
            }

            if attempt < attempts {
                let delay = self.backoff.delay(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");
                tokio::time::sleep(delay).await;
            }
        }

        error!(event = %event.event_type, attempts, "Giving up on event delivery");
        false
    }
}

impl EventForwarder {
    /// One bounded attempt. Any non-2xx answer is [`TransportError::Status`].
    async fn deliver_once(
        &self,
        url: &str,
        api_key: Option<&str>,
        event: &Event,
    ) -> TransportResult<()> {
        let timeout = self.config.timeout();
        let status = tokio::time::timeout(timeout, self.transport.post_event(url, api_key, event))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(TransportError::Status(status))
        }
    }
}

impl std::fmt::Debug for EventForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventForwarder")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    enum Step {
        Status(u16),
        Fail,
        Hang,
    }

    /// Replays a fixed script of responses and records when each call started.
    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<(Instant, String, Option<String>)>>,
    }

    impl Scripted {
        fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|c| c.0).collect()
        }
    }

    #[async_trait]
    impl EventTransport for Scripted {
        async fn post_event(
            &self,
            url: &str,
            api_key: Option<&str>,
            _event: &Event,
        ) -> TransportResult<u16> {
            self.calls.lock().unwrap().push((
                Instant::now(),
                url.to_string(),
                api_key.map(str::to_owned),
            ));
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Status(code)) => Ok(code),
                Some(Step::Fail) | None => {
                    Err(TransportError::Request("connection refused".into()))
                }
                Some(Step::Hang) => std::future::pending().await,
            }
        }
    }

    fn forwarder(config: ForwarderConfig, transport: &Arc<Scripted>) -> EventForwarder {
        EventForwarder::with_transport(config, transport.clone())
    }

    fn event() -> Event {
        Event::new("transfer").with("conversationId", "conv-1")
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            ForwarderConfig::new("http://agent:8454/").endpoint(),
            "http://agent:8454/blockchain-event"
        );
        assert_eq!(
            ForwarderConfig::new("http://agent:8454").endpoint(),
            "http://agent:8454/blockchain-event"
        );
    }

    #[test]
    fn test_backoff_schedule_is_capped() {
        let backoff = BackoffPolicy::default();
        let delays: Vec<u128> = (1..=5).map(|n| backoff.delay(n).as_millis()).collect();
        assert_eq!(delays, [1000, 2000, 4000, 5000, 5000]);
        assert_eq!(backoff.delay(64), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = Scripted::new([Step::Status(200)]);
        let fwd = forwarder(
            ForwarderConfig::new("http://agent/").with_api_key("secret"),
            &transport,
        );

        assert!(fwd.forward_event(&event()).await);

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "http://agent/blockchain-event");
        assert_eq!(calls[0].2.as_deref(), Some("secret"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_retry_with_backoff_then_give_up() {
        let transport = Scripted::new([Step::Status(500), Step::Status(500), Step::Status(500)]);
        let fwd = forwarder(ForwarderConfig::new("http://agent"), &transport);

        assert!(!fwd.forward_event(&event()).await);

        let times = transport.call_times();
        assert_eq!(times.len(), 3);
        assert!(times[1] - times[0] >= Duration::from_millis(1000));
        assert!(times[2] - times[1] >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let transport = Scripted::new([Step::Status(404), Step::Status(200)]);
        let fwd = forwarder(ForwarderConfig::new("http://agent"), &transport);

        let start = Instant::now();
        assert!(!fwd.forward_event(&event()).await);

        assert_eq!(transport.call_times().len(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_network_error() {
        let transport = Scripted::new([Step::Fail, Step::Status(201)]);
        let fwd = forwarder(ForwarderConfig::new("http://agent"), &transport);

        assert!(fwd.forward_event(&event()).await);
        assert_eq!(transport.call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failed_attempt() {
        let transport = Scripted::new([Step::Hang, Step::Status(200)]);
        let fwd = forwarder(
            ForwarderConfig::new("http://agent").with_timeout_ms(50),
            &transport,
        );

        assert!(fwd.forward_event(&event()).await);

        let times = transport.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(1050));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_reports_typed_failures() {
        let transport = Scripted::new([Step::Hang, Step::Status(503), Step::Status(204)]);
        let fwd = forwarder(
            ForwarderConfig::new("http://agent").with_timeout_ms(50),
            &transport,
        );
        let url = fwd.config().endpoint();

        let err = fwd.deliver_once(&url, None, &event()).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(d) if d == Duration::from_millis(50)));

        let err = fwd.deliver_once(&url, None, &event()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status(503)));

        assert!(fwd.deliver_once(&url, None, &event()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_still_attempts_once() {
        let transport = Scripted::new([Step::Status(503)]);
        let fwd = forwarder(
            ForwarderConfig::new("http://agent").with_max_retries(0),
            &transport,
        );

        assert!(!fwd.forward_event(&event()).await);
        assert_eq!(transport.call_times().len(), 1);
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ForwarderConfig =
            serde_json::from_str(r#"{ "agent_url": "http://a" }"#).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.api_key, None);
    }
}
