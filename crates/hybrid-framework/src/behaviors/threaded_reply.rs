use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::behavior::{Behavior, BehaviorConfig, Flow, Hook, HookResult, Hooks};
use crate::context::BehaviorContext;

pub const THREADED_REPLY_ID: &str = "threaded-reply";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadedReplyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ThreadedReplyConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

struct ThreadedReply;

#[async_trait]
impl Hook for ThreadedReply {
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult {
        ctx.send_options.threaded = Some(true);
        Ok(Flow::Continue)
    }
}

/// Makes the agent answer inside the inbound message's thread.
pub fn threaded_reply(config: ThreadedReplyConfig) -> Behavior {
    Behavior::new(
        THREADED_REPLY_ID,
        BehaviorConfig {
            enabled: config.enabled,
            data: Map::new(),
        },
        Hooks::After(Arc::new(ThreadedReply)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Phase;
    use crate::chain::ExecutionChain;
    use crate::test_support::{runtime, text_message};

    #[tokio::test]
    async fn test_sets_threaded_in_after_phase() {
        let behavior = Arc::new(threaded_reply(ThreadedReplyConfig::default()));
        assert_eq!(behavior.id(), THREADED_REPLY_ID);
        assert!(!behavior.has_before());

        let mut ctx = BehaviorContext::new(runtime(text_message("hi")));
        ExecutionChain::new()
            .run(Phase::After, &[behavior], &mut ctx)
            .await;

        assert_eq!(ctx.send_options.threaded, Some(true));
    }

    #[tokio::test]
    async fn test_disabled_leaves_threaded_unset() {
        let behavior = Arc::new(threaded_reply(ThreadedReplyConfig { enabled: false }));

        let mut ctx = BehaviorContext::new(runtime(text_message("hi")));
        ExecutionChain::new()
            .run(Phase::After, &[behavior], &mut ctx)
            .await;

        assert_eq!(ctx.send_options.threaded, None);
    }
}
