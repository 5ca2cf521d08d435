use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::message::Message;

/// Processes exactly one message type.
///
/// Implementations own their collaborators (storage, executors); the
/// mediator shares one instance across concurrent dispatches, so any mutable
/// state must be synchronised by the handler itself.
#[async_trait]
pub trait Handler<M: Message>: Send + Sync + 'static {
    async fn handle(
        &self, message: M, cancel: &CancellationToken,
    ) -> Result<M::Output, M::Error>;
}

#[async_trait]
impl<M, H> Handler<M> for Arc<H>
where
    M: Message,
    H: Handler<M> + ?Sized,
{
    async fn handle(
        &self, message: M, cancel: &CancellationToken,
    ) -> Result<M::Output, M::Error> {
        (**self).handle(message, cancel).await
    }
}
