//! Built-in behaviors.
//!
//! Each factory takes a small configuration struct and returns a ready
//! [`Behavior`](crate::Behavior) to register with an agent.
//!
//! | Factory | Behavior ID | Phase | Effect |
//! |---------|-------------|-------|--------|
//! | [`threaded_reply`] | `threaded-reply` | after | Sends the response as a threaded reply |
//! | [`react_with`] | `react-with-<emoji>` | before | Reacts to the inbound message |
//! | [`filter_messages`] | `filter-messages` | before | Vetoes messages a filter rejects |
//! | [`rate_limit`] | `rate-limit` | before | Vetoes senders over a message quota |
//!
//! ```rust,ignore
//! use hybrid_framework::behaviors::*;
//!
//! registry.register_all([
//!     react_with("👀", ReactWithConfig::default()),
//!     threaded_reply(ThreadedReplyConfig::default()),
//! ]);
//! ```

mod filter_messages;
mod rate_limit;
mod react_with;
mod threaded_reply;

pub use filter_messages::{FILTER_MESSAGES_ID, filter_messages, filter_messages_with};
pub use rate_limit::{RATE_LIMIT_ID, RateLimitConfig, rate_limit};
pub use react_with::{ReactWithConfig, react_with};
pub use threaded_reply::{THREADED_REPLY_ID, ThreadedReplyConfig, threaded_reply};
