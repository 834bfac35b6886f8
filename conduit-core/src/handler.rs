//! # Handler
//!
//! The terminal endpoint of a command or query. A bus resolves the handler
//! class mapped to a message's name, builds it, and calls it exactly once per
//! `execute`.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Handler`] uses native `async fn` and a typed message. The bus only knows
//! handlers by class name, so it drives them through [`DynHandler`], which
//! every `Handler` implements automatically.

use crate::{error::BoxError, error::BusError, message::Message};
use futures::future::BoxFuture;
use std::future::Future;

/// Handles one message type and produces a reply.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a message `Handler`",
    label = "missing `Handler` implementation",
    note = "Handlers must implement `handle` for their `Message` type."
)]
pub trait Handler: Send + Sync + 'static {
    /// The message this handler accepts.
    type Message: Message;
    /// The reply returned to the bus caller.
    type Reply: Message;

    /// Executes the handler logic.
    fn handle(
        &self,
        message: &Self::Message,
    ) -> impl Future<Output = Result<Self::Reply, BoxError>> + Send;
}

/// Object-safe version of [`Handler`].
pub trait DynHandler: Send + Sync + 'static {
    /// Handles a type-erased message (dynamic dispatch version).
    fn handle_dyn<'a>(
        &'a self,
        message: &'a dyn Message,
    ) -> BoxFuture<'a, Result<Box<dyn Message>, BoxError>>;
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<T: Handler> DynHandler for T {
    fn handle_dyn<'a>(
        &'a self,
        message: &'a dyn Message,
    ) -> BoxFuture<'a, Result<Box<dyn Message>, BoxError>> {
        Box::pin(async move {
            let typed = message.downcast_ref::<T::Message>().ok_or_else(|| {
                BusError::MessageMismatch {
                    expected: std::any::type_name::<T::Message>(),
                    actual: message.message_name().to_owned(),
                }
            })?;
            let reply = self.handle(typed).await?;
            Ok::<_, BoxError>(Box::new(reply) as Box<dyn Message>)
        })
    }
}
