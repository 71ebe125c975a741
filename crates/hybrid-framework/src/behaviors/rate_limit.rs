use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::behavior::{Behavior, BehaviorConfig, Flow, Hook, HookResult, Hooks};
use crate::context::BehaviorContext;
use crate::error::{BehaviorError, BehaviorResult};

pub const RATE_LIMIT_ID: &str = "rate-limit";

/// Per-sender quota: at most `max_messages` within any `window`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub max_messages: usize,
    #[serde(with = "millis")]
    pub window: Duration,
}

fn default_true() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: 5,
            window: Duration::from_secs(60),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

struct RateLimit {
    max_messages: usize,
    window: Duration,
    ledger: Mutex<Ledger>,
}

#[derive(Default)]
struct Ledger {
    /// Accepted message timestamps per sender inbox ID, oldest first.
    senders: HashMap<String, VecDeque<Instant>>,
    last_sweep: Option<Instant>,
}

impl RateLimit {
    fn new(max_messages: usize, window: Duration) -> Self {
        Self {
            max_messages,
            window,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Records a message from `sender` if it fits the quota.
    fn admit(&self, sender: &str, now: Instant) -> bool {
        let mut ledger = self.ledger.lock();
        self.sweep_if_due(&mut ledger, now);

        let stamps = ledger.senders.entry(sender.to_string()).or_default();
        while stamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            stamps.pop_front();
        }
        if stamps.len() >= self.max_messages {
            return false;
        }
        stamps.push_back(now);
        true
    }

    /// At most once per window, drops senders with nothing left inside it.
    fn sweep_if_due(&self, ledger: &mut Ledger, now: Instant) {
        let due = ledger
            .last_sweep
            .is_none_or(|t| now.duration_since(t) >= self.window);
        if !due {
            return;
        }
        ledger.last_sweep = Some(now);
        let window = self.window;
        ledger.senders.retain(|_, stamps| {
            stamps
                .back()
                .is_some_and(|&t| now.duration_since(t) < window)
        });
    }
}

#[async_trait]
impl Hook for RateLimit {
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult {
        let sender = &ctx.message().sender_inbox_id;
        if self.admit(sender, Instant::now()) {
            return Ok(Flow::Continue);
        }
        debug!(sender = %sender, limit = self.max_messages, "Sender is over the rate limit");
        ctx.send_options.filtered = Some(true);
        Ok(Flow::Stop)
    }
}

/// Vetoes messages from senders who exceed the configured quota.
///
/// Fails with [`BehaviorError::InvalidConfig`] when the quota or window is zero.
pub fn rate_limit(config: RateLimitConfig) -> BehaviorResult<Behavior> {
    if config.max_messages == 0 {
        return Err(BehaviorError::InvalidConfig(
            "rate-limit max_messages must be at least 1".into(),
        ));
    }
    if config.window.is_zero() {
        return Err(BehaviorError::InvalidConfig(
            "rate-limit window must be non-zero".into(),
        ));
    }

    let mut data = Map::new();
    data.insert("maxMessages".into(), Value::from(config.max_messages));
    data.insert(
        "windowMs".into(),
        Value::from(config.window.as_millis() as u64),
    );

    Ok(Behavior::new(
        RATE_LIMIT_ID,
        BehaviorConfig {
            enabled: config.enabled,
            data,
        },
        Hooks::Before(Arc::new(RateLimit::new(config.max_messages, config.window))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Phase;
    use crate::chain::ExecutionChain;
    use crate::test_support::runtime;
    use hybrid_core::{DecodedMessage, MessageContent};

    fn from(sender: &str) -> BehaviorContext {
        BehaviorContext::new(runtime(DecodedMessage::new(
            "m",
            "conv-1",
            sender,
            MessageContent::text("hi"),
        )))
    }

    async fn admitted(chain: &ExecutionChain, behavior: &Arc<Behavior>, sender: &str) -> bool {
        let mut ctx = from(sender);
        chain
            .run(Phase::Before, std::slice::from_ref(behavior), &mut ctx)
            .await;
        !ctx.send_options.is_filtered()
    }

    #[test]
    fn test_rejects_zero_quota() {
        let err = rate_limit(RateLimitConfig {
            max_messages: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, BehaviorError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_is_per_sender_and_window_slides() {
        let behavior = Arc::new(
            rate_limit(RateLimitConfig {
                enabled: true,
                max_messages: 2,
                window: Duration::from_secs(10),
            })
            .unwrap(),
        );
        assert_eq!(behavior.data()["maxMessages"], 2);
        assert_eq!(behavior.data()["windowMs"], 10_000);

        let chain = ExecutionChain::new();
        assert!(admitted(&chain, &behavior, "alice").await);
        assert!(admitted(&chain, &behavior, "alice").await);
        assert!(!admitted(&chain, &behavior, "alice").await);
        assert!(admitted(&chain, &behavior, "bob").await);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(admitted(&chain, &behavior, "alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_senders_are_forgotten() {
        let limiter = RateLimit::new(1, Duration::from_millis(10));

        for n in 0..1000 {
            assert!(limiter.admit(&format!("sender-{n}"), Instant::now()));
            tokio::time::advance(Duration::from_millis(20)).await;
        }
        assert!(limiter.ledger.lock().senders.len() <= 1);

        assert!(limiter.admit("sender-999", Instant::now()));
        assert!(!limiter.admit("sender-999", Instant::now()));
        assert_eq!(limiter.ledger.lock().senders.len(), 1);
    }
}
