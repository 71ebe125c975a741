use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::behavior::{Behavior, BehaviorConfig, Flow, Hook, HookResult, Hooks};
use crate::context::BehaviorContext;
use crate::filter::{Filter, FilterHelpers, create_filter};

pub const FILTER_MESSAGES_ID: &str = "filter-messages";

struct FilterMessages {
    filter: Filter,
}

#[async_trait]
impl Hook for FilterMessages {
    async fn call(&self, ctx: &mut BehaviorContext) -> HookResult {
        if self.filter.matches(ctx.runtime()) {
            return Ok(Flow::Continue);
        }
        debug!(message = %ctx.message().id, "Message rejected by filter-messages");
        ctx.send_options.filtered = Some(true);
        Ok(Flow::Stop)
    }
}

/// Vetoes every message for which `builder` returns `false`.
///
/// ```rust,ignore
/// let behavior = filter_messages(|f| f.is_text() && !f.from_self());
/// ```
pub fn filter_messages<F>(builder: F) -> Behavior
where
    F: for<'a> Fn(&FilterHelpers<'a>) -> bool + Send + Sync + 'static,
{
    filter_messages_with(create_filter(builder))
}

/// Like [`filter_messages`], for an already composed [`Filter`].
pub fn filter_messages_with(filter: Filter) -> Behavior {
    Behavior::new(
        FILTER_MESSAGES_ID,
        BehaviorConfig::default(),
        Hooks::Before(Arc::new(FilterMessages { filter })),
    )
}
