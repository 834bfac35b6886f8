//! # Listener
//!
//! Reacts to an [`Event`] during dispatch. Listeners run one after another in
//! registration order and share the same mutable event, so an earlier
//! listener can enrich the data bag or stop propagation for the later ones.

use crate::{error::BoxError, event::Event};
use futures::future::BoxFuture;
use std::future::Future;

/// An event listener.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an event `Listener`",
    label = "missing `Listener` implementation",
    note = "Listeners must implement `handle(&self, &mut Event)`."
)]
pub trait Listener: Send + Sync + 'static {
    /// Called once per dispatch this listener takes part in.
    fn handle(&self, event: &mut Event) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`Listener`].
pub trait DynListener: Send + Sync + 'static {
    /// Called when an event is dispatched (dynamic dispatch version).
    fn handle_dyn<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<T: Listener> DynListener for T {
    fn handle_dyn<'a>(&'a self, event: &'a mut Event) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.handle(event))
    }
}
