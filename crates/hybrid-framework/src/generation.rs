//! The language-model collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use hybrid_core::GenerationResult;

use crate::context::BehaviorContext;

/// Produces the agent's response for a message.
///
/// The generator sees the context after every before-hook has run, so it can
/// read the inbound message and whatever options the behaviors settled on.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, ctx: &BehaviorContext) -> GenerationResult<String>;
}

/// Shared handle to a generator.
pub type BoxedGenerator = Arc<dyn Generator>;

/// Adapter that turns a closure into a [`Generator`].
pub struct GeneratorFn<F> {
    f: F,
}

#[async_trait]
impl<F> Generator for GeneratorFn<F>
where
    F: for<'a> Fn(&'a BehaviorContext) -> BoxFuture<'a, GenerationResult<String>> + Send + Sync,
{
    async fn generate(&self, ctx: &BehaviorContext) -> GenerationResult<String> {
        (self.f)(ctx).await
    }
}

/// Wraps a closure returning a boxed future as a [`BoxedGenerator`].
pub fn generator_fn<F>(f: F) -> BoxedGenerator
where
    F: for<'a> Fn(&'a BehaviorContext) -> BoxFuture<'a, GenerationResult<String>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(GeneratorFn { f })
}
