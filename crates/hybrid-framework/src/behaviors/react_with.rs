use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use hybrid_core::{OutgoingMessage, Reaction};

use crate::behavior::{Behavior, BehaviorConfig, Flow, Hook, HookResult, Hooks};
use crate::context::BehaviorContext;
use crate::filter::{FilterHelpers, FilterInput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactWithConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// React to every message instead of only DMs and mentions.
    #[serde(default = "default_true")]
    pub react_to_all: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReactWithConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            react_to_all: true,
        }
    }
}

struct ReactWith {
    reaction: String,
    react_to_all: bool,
}

impl ReactWith {
    /// DMs always qualify; in groups the agent must be mentioned.
    fn should_react(&self, ctx: &BehaviorContext) -> bool {
        if self.react_to_all {
            return true;
        }
        let input = FilterInput::from_runtime(ctx.runtime());
        let f = FilterHelpers::new(&input);
        let client = ctx.client();
        f.is_dm()
            || f.has_mention(client.inbox_id())
            || client.address().is_some_and(|address| f.has_mention(address))
    }
}

#[async_trait]
impl Hook for ReactWith {
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult {
        if !self.should_react(ctx) {
            return Ok(Flow::Continue);
        }

        let reaction = Reaction::unicode(ctx.message().id.clone(), self.reaction.clone());
        ctx.conversation()
            .send(OutgoingMessage::reaction(reaction))
            .await?;
        debug!(message = %ctx.message().id, reaction = %self.reaction, "Reacted to message");

        Ok(Flow::Continue)
    }
}

/// Reacts to the inbound message with `reaction` before the response is generated.
pub fn react_with(reaction: impl Into<String>, config: ReactWithConfig) -> Behavior {
    let reaction = reaction.into();

    let mut data = Map::new();
    data.insert("reaction".into(), Value::from(reaction.clone()));
    data.insert("reactToAll".into(), Value::from(config.react_to_all));

    Behavior::new(
        format!("react-with-{reaction}"),
        BehaviorConfig {
            enabled: config.enabled,
            data,
        },
        Hooks::Before(Arc::new(ReactWith {
            reaction,
            react_to_all: config.react_to_all,
        })),
    )
}
