//! Testing utilities for Conduit.
//!
//! Listeners are built by class name, so the utilities here share state
//! through a container service rather than through clones:
//!
//! - [`EventLog`]: a shared record, installed in the container as `event_log`
//! - [`RecordingListener`]: appends `"<label>:<event>"` to the log
//! - [`StoppingListener`]: records, then stops propagation
//! - [`FailingListener`]: records, then fails
//!
//! # Example
//!
//! ```rust,ignore
//! let mut types = TypeRegistry::new();
//! types
//!     .insert(RecordingListener::blueprint("First"))
//!     .insert(StoppingListener::blueprint("Stop"));
//! let container = Container::new(types);
//! let log = EventLog::install(&container);
//!
//! bus.register("order.created", "First");
//! bus.dispatch(Event::new("order.created")).await?;
//! assert_eq!(log.entries(), ["First:order.created"]);
//! ```

use crate::container::Container;
use conduit_core::{
    Arguments, BoxError, Blueprint, Constructible, Event, Instance, Listener, Parameter,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Service id [`EventLog::install`] registers the log under.
pub const EVENT_LOG_ID: &str = "event_log";

// ============================================================================
// Event Log
// ============================================================================

/// An append-only record shared by the testing listeners.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<String>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh log in `container` and return it.
    ///
    /// If the container already has a log, that one is returned.
    pub fn install(container: &Container) -> Arc<EventLog> {
        let log = Arc::new(EventLog::new());
        // First definition wins, so a repeated install is a no-op.
        if let Err(error) =
            container.set_instance(EVENT_LOG_ID, Instance::from_arc(Self::NAME, log.clone()))
        {
            debug!(%error, "event log not installed");
        }
        container.resolve::<EventLog>(EVENT_LOG_ID).unwrap_or(log)
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Get a copy of every entry, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Get the number of entries.
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Constructible for EventLog {
    const NAME: &'static str = "conduit::testing::EventLog";

    fn construct(_args: &Arguments) -> Result<Self, BoxError> {
        Ok(EventLog::new())
    }
}

fn log_parameter() -> Vec<Parameter> {
    vec![Parameter::typed(EVENT_LOG_ID, EventLog::NAME)]
}

// ============================================================================
// Recording Listener
// ============================================================================

/// A listener that records every event it receives.
pub struct RecordingListener {
    label: &'static str,
    log: Arc<EventLog>,
}

impl RecordingListener {
    /// A blueprint registering this listener under the class name `label`.
    pub fn blueprint(label: &'static str) -> Blueprint {
        Blueprint::new(label, log_parameter(), move |args| {
            let log = args.service::<EventLog>(EVENT_LOG_ID)?;
            Ok(Instance::listener(label, RecordingListener { label, log }))
        })
    }
}

impl Listener for RecordingListener {
    async fn handle(&self, event: &mut Event) -> Result<(), BoxError> {
        self.log.record(format!("{}:{}", self.label, event.identifier()));
        Ok(())
    }
}

// ============================================================================
// Stopping Listener
// ============================================================================

/// A listener that records the event and stops its propagation.
pub struct StoppingListener {
    label: &'static str,
    log: Arc<EventLog>,
}

impl StoppingListener {
    /// A blueprint registering this listener under the class name `label`.
    pub fn blueprint(label: &'static str) -> Blueprint {
        Blueprint::new(label, log_parameter(), move |args| {
            let log = args.service::<EventLog>(EVENT_LOG_ID)?;
            Ok(Instance::listener(label, StoppingListener { label, log }))
        })
    }
}

impl Listener for StoppingListener {
    async fn handle(&self, event: &mut Event) -> Result<(), BoxError> {
        self.log.record(format!("{}:{}", self.label, event.identifier()));
        event.stop_propagation();
        Ok(())
    }
}

// ============================================================================
// Failing Listener
// ============================================================================

/// A listener that records the event and then fails.
pub struct FailingListener {
    label: &'static str,
    log: Arc<EventLog>,
}

impl FailingListener {
    /// A blueprint registering this listener under the class name `label`.
    pub fn blueprint(label: &'static str) -> Blueprint {
        Blueprint::new(label, log_parameter(), move |args| {
            let log = args.service::<EventLog>(EVENT_LOG_ID)?;
            Ok(Instance::listener(label, FailingListener { label, log }))
        })
    }
}

impl Listener for FailingListener {
    async fn handle(&self, event: &mut Event) -> Result<(), BoxError> {
        self.log.record(format!("{}:{}", self.label, event.identifier()));
        Err(format!("{} refused `{}`", self.label, event.identifier()).into())
    }
}
