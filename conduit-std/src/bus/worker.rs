//! Background event dispatch.

use super::event_bus::Notifier;
use conduit_core::{BusError, Event};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

struct DispatchJob {
    event: Event,
    listeners: Vec<String>,
}

/// Notifies listeners on a spawned task, one job at a time.
///
/// Submitting never waits for the listeners. Their failures are logged and
/// dropped.
pub(crate) struct DispatchWorker {
    sender: mpsc::UnboundedSender<DispatchJob>,
    task: JoinHandle<()>,
}

impl DispatchWorker {
    /// Start the worker on the current tokio runtime.
    pub(crate) fn spawn(notifier: Notifier) -> Result<Self, BusError> {
        let runtime = Handle::try_current()
            .map_err(|e| BusError::WorkerUnavailable(format!("no tokio runtime: {e}")))?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<DispatchJob>();

        let task = runtime.spawn(async move {
            while let Some(DispatchJob {
                mut event,
                listeners,
            }) = receiver.recv().await
            {
                let identifier = event.identifier().to_owned();
                match notifier.notify(&mut event, &listeners).await {
                    Ok(()) => debug!(event = %identifier, "background dispatch finished"),
                    Err(error) => {
                        warn!(event = %identifier, %error, "background listener failed")
                    }
                }
            }
            debug!("dispatch worker stopped");
        });

        debug!("dispatch worker started");
        Ok(Self { sender, task })
    }

    /// Queue `event` for `listeners`.
    pub(crate) fn submit(&self, event: Event, listeners: Vec<String>) -> Result<(), BusError> {
        self.sender
            .send(DispatchJob { event, listeners })
            .map_err(|_| BusError::WorkerUnavailable("dispatch worker has stopped".to_owned()))
    }

    /// Close the queue and wait until every queued job ran.
    pub(crate) async fn shutdown(self) {
        drop(self.sender);
        if let Err(error) = self.task.await {
            warn!(%error, "dispatch worker ended abnormally");
        }
    }
}
