use super::worker::DispatchWorker;
use crate::{config::ConduitConfig, container::Container, manifest::ManifestReader};
use conduit_core::{BusError, Event, ManifestError, Message};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, fmt, path::Path};
use tracing::{debug, trace};

/// Event name whose listeners receive every event.
pub const WILDCARD: &str = "*";

/// A listener class registered for an event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRegistration {
    /// The listener class, built on every dispatch.
    pub class: String,
    /// Declared priority. Recorded only; listeners run in registration order.
    pub priority: Option<i64>,
}

// ============================================================================
// Notifier
// ============================================================================

/// Builds listeners and runs them against one event.
#[derive(Clone)]
pub(crate) struct Notifier {
    container: Container,
}

impl Notifier {
    pub(crate) fn new(container: Container) -> Self {
        Self { container }
    }

    /// Run `listeners` in order until one fails or propagation stops.
    pub(crate) async fn notify(&self, event: &mut Event, listeners: &[String]) -> Result<(), BusError> {
        let identifier = event.identifier().to_owned();
        for class in listeners {
            if event.is_propagation_stopped() {
                debug!(event = %identifier, "propagation stopped");
                break;
            }

            let instance = self
                .container
                .builder()
                .build(&self.container, class, &[])
                .map_err(|source| BusError::Build {
                    class: class.clone(),
                    source,
                })?;
            let listener = instance
                .as_listener()
                .ok_or_else(|| BusError::NotAListener(class.clone()))?;

            trace!(event = %identifier, listener = %class, "notifying listener");
            listener
                .handle_dyn(event)
                .await
                .map_err(|source| BusError::Listener {
                    event: identifier.clone(),
                    listener: class.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Dispatches events to the listeners registered for their name.
///
/// Listeners registered for the exact name run first, then those registered
/// for [`WILDCARD`]. Within each group they run in registration order.
///
/// On the command line with `async_events` enabled, dispatch hands the event
/// to a background worker and returns at once. The worker is started on the
/// first such dispatch and stopped by [`EventBus::shutdown`].
pub struct EventBus {
    container: Container,
    config: ConduitConfig,
    listeners: RwLock<HashMap<String, Vec<ListenerRegistration>>>,
    notifier: Notifier,
    worker: Mutex<Option<DispatchWorker>>,
    manifests: ManifestReader,
}

impl EventBus {
    /// An event bus dispatching synchronously.
    pub fn new(container: Container) -> Self {
        Self::with_config(container, ConduitConfig::default())
    }

    /// An event bus configured by `config`.
    pub fn with_config(container: Container, config: ConduitConfig) -> Self {
        let manifests = config.manifest_reader();
        Self {
            notifier: Notifier::new(container.clone()),
            container,
            config,
            listeners: RwLock::new(HashMap::new()),
            worker: Mutex::new(None),
            manifests,
        }
    }

    /// Read listener manifests with `manifests`.
    pub fn with_manifest_reader(mut self, manifests: ManifestReader) -> Self {
        self.manifests = manifests;
        self
    }

    /// The container listeners are built from.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Register `listener` for `event_name`.
    pub fn register(&self, event_name: impl Into<String>, listener: impl Into<String>) {
        self.register_with_priority(event_name, listener, None);
    }

    /// Register `listener` for `event_name` with a declared priority.
    pub fn register_with_priority(
        &self,
        event_name: impl Into<String>,
        listener: impl Into<String>,
        priority: Option<i64>,
    ) {
        let event_name = event_name.into();
        let class = listener.into();
        debug!(event = %event_name, listener = %class, "listener registered");
        self.listeners
            .write()
            .entry(event_name)
            .or_default()
            .push(ListenerRegistration { class, priority });
    }

    /// Listener classes registered for exactly `event_name`.
    pub fn get_listeners(&self, event_name: &str) -> Vec<String> {
        self.registrations(event_name)
            .into_iter()
            .map(|registration| registration.class)
            .collect()
    }

    /// Registrations for exactly `event_name`, priorities included.
    pub fn registrations(&self, event_name: &str) -> Vec<ListenerRegistration> {
        self.listeners
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether dispatch goes to the background worker.
    pub fn async_mode(&self) -> bool {
        self.config.async_mode()
    }

    /// Dispatch `event` and return it.
    ///
    /// In synchronous mode the returned event carries whatever the listeners
    /// changed. In async mode it is returned unchanged.
    pub async fn dispatch(&self, mut event: Event) -> Result<Event, BusError> {
        let identifier = event.identifier().to_owned();
        let listeners = self.listeners_for(&identifier);
        if listeners.is_empty() {
            trace!(event = %identifier, "no listeners");
            return Ok(event);
        }

        if self.async_mode() {
            self.submit(event.clone(), listeners)?;
            debug!(event = %identifier, "event queued for background dispatch");
            return Ok(event);
        }

        debug!(event = %identifier, listeners = listeners.len(), "dispatching event");
        self.notify_listeners(&mut event, &listeners).await?;
        Ok(event)
    }

    /// Run `listeners` against `event` in order.
    ///
    /// Stops early once a listener stops propagation. A failing listener
    /// aborts the rest.
    pub async fn notify_listeners(&self, event: &mut Event, listeners: &[String]) -> Result<(), BusError> {
        self.notifier.notify(event, listeners).await
    }

    /// Dispatch `message` if it is an [`Event`].
    pub async fn execute(&self, message: &dyn Message) -> Result<Option<Event>, BusError> {
        match message.downcast_ref::<Event>() {
            Some(event) => self.dispatch(event.clone()).await.map(Some),
            None => Ok(None),
        }
    }

    /// Load a listener manifest. Returns the number of listeners registered.
    pub fn load_handlers_from_json_file(&self, path: impl AsRef<Path>) -> Result<usize, ManifestError> {
        self.manifests.load_listeners(self, path.as_ref())
    }

    /// Stop the background worker after it drained its queue.
    ///
    /// A later async dispatch starts a new worker.
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.shutdown().await;
        }
    }

    fn listeners_for(&self, identifier: &str) -> Vec<String> {
        let listeners = self.listeners.read();
        let exact = listeners.get(identifier).into_iter().flatten();
        let wildcard = listeners.get(WILDCARD).into_iter().flatten();
        exact
            .chain(wildcard)
            .map(|registration| registration.class.clone())
            .collect()
    }

    fn submit(&self, event: Event, listeners: Vec<String>) -> Result<(), BusError> {
        let mut worker = self.worker.lock();
        if worker.is_none() {
            *worker = Some(DispatchWorker::spawn(self.notifier.clone())?);
        }
        match worker.as_ref() {
            Some(worker) => worker.submit(event, listeners),
            None => Err(BusError::WorkerUnavailable("dispatch worker missing".to_owned())),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.listeners.read().len())
            .field("async_mode", &self.async_mode())
            .finish_non_exhaustive()
    }
}
