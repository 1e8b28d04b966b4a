/*
[INPUT]:  Consumer closures or types registered on sessions and connections
[OUTPUT]: Object-safe callback traits invoked by dispatch and loss handling
[POS]:    WebSocket layer - consumer callback contracts
[UPDATE]: When callback signatures change
*/

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::warn;

use crate::error::{Result, XenaError};
use crate::registry::Message;

/// Consumer of inbound messages.
///
/// Runs on the read loop; long work should be handed off to another task.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_message(&self, message: Message);
}

#[async_trait]
impl<F, Fut> Listener for F
where
    F: Fn(Message) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_message(&self, message: Message) {
        (self)(message).await
    }
}

/// Called with the triggering error when a channel fails unexpectedly
#[async_trait]
pub trait ConnectionLostHandler: Send + Sync {
    async fn on_connection_lost(&self, error: Arc<XenaError>) -> Result<()>;
}

#[async_trait]
impl<F, Fut> ConnectionLostHandler for F
where
    F: Fn(Arc<XenaError>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn on_connection_lost(&self, error: Arc<XenaError>) -> Result<()> {
        (self)(error).await
    }
}

/// Deliver one message, containing a panicking consumer
pub(crate) async fn deliver(listener: &Arc<dyn Listener>, message: Message, route: &str) {
    let msg_type = message.msg_type();
    if AssertUnwindSafe(listener.on_message(message))
        .catch_unwind()
        .await
        .is_err()
    {
        warn!(route, msg_type = %msg_type, "listener panicked");
    }
}
