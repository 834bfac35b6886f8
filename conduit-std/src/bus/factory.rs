use super::{
    event_bus::EventBus,
    message_bus::{BusKind, COMMAND_KIND, CommandBus, MessageBus, QUERY_KIND, QueryBus},
};
use crate::{config::ConduitConfig, container::Container};
use conduit_core::BusError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Any bus a [`BusFactory`] creates.
#[derive(Debug, Clone)]
pub enum AnyBus {
    /// The command bus.
    Command(Arc<CommandBus>),
    /// The query bus.
    Query(Arc<QueryBus>),
    /// The event bus.
    Event(Arc<EventBus>),
}

impl AnyBus {
    /// The kind name of the bus.
    pub fn kind(&self) -> &'static str {
        match self {
            AnyBus::Command(_) => COMMAND_KIND,
            AnyBus::Query(_) => QUERY_KIND,
            AnyBus::Event(_) => EVENT_KIND,
        }
    }

    /// The command bus, if this is one.
    pub fn as_command(&self) -> Option<&Arc<CommandBus>> {
        match self {
            AnyBus::Command(bus) => Some(bus),
            _ => None,
        }
    }

    /// The query bus, if this is one.
    pub fn as_query(&self) -> Option<&Arc<QueryBus>> {
        match self {
            AnyBus::Query(bus) => Some(bus),
            _ => None,
        }
    }

    /// The event bus, if this is one.
    pub fn as_event(&self) -> Option<&Arc<EventBus>> {
        match self {
            AnyBus::Event(bus) => Some(bus),
            _ => None,
        }
    }
}

/// Kind name of the event bus.
pub const EVENT_KIND: &str = "event";

/// Creates each bus once and shares one [`EventBus`] between them.
///
/// # Example
/// ```ignore
/// let buses = BusFactory::new(container, ConduitConfig::from_env());
/// buses.command_bus().load_handlers_from_json_file("config/handlers.json")?;
/// let reply = buses.command_bus().execute(&CreateOrder { .. }).await?;
/// buses.shutdown().await;
/// ```
pub struct BusFactory {
    container: Container,
    config: ConduitConfig,
    events: Mutex<Option<Arc<EventBus>>>,
    commands: Mutex<Option<Arc<CommandBus>>>,
    queries: Mutex<Option<Arc<QueryBus>>>,
}

impl BusFactory {
    /// A factory creating buses over `container`, configured by `config`.
    pub fn new(container: Container, config: ConduitConfig) -> Self {
        Self {
            container,
            config,
            events: Mutex::new(None),
            commands: Mutex::new(None),
            queries: Mutex::new(None),
        }
    }

    /// The container buses build from.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The bus of `kind`: `"command"`, `"query"` or `"event"`.
    pub fn create(&self, kind: &str) -> Result<AnyBus, BusError> {
        match kind {
            COMMAND_KIND => Ok(AnyBus::Command(self.command_bus())),
            QUERY_KIND => Ok(AnyBus::Query(self.query_bus())),
            EVENT_KIND => Ok(AnyBus::Event(self.event_bus())),
            other => Err(BusError::InvalidBusType(other.to_owned())),
        }
    }

    /// The shared event bus.
    pub fn event_bus(&self) -> Arc<EventBus> {
        self.events
            .lock()
            .get_or_insert_with(|| {
                debug!(kind = EVENT_KIND, "bus created");
                Arc::new(EventBus::with_config(
                    self.container.clone(),
                    self.config.clone(),
                ))
            })
            .clone()
    }

    /// The command bus.
    pub fn command_bus(&self) -> Arc<CommandBus> {
        let events = self.event_bus();
        self.commands
            .lock()
            .get_or_insert_with(|| self.message_bus(events))
            .clone()
    }

    /// The query bus.
    pub fn query_bus(&self) -> Arc<QueryBus> {
        let events = self.event_bus();
        self.queries
            .lock()
            .get_or_insert_with(|| self.message_bus(events))
            .clone()
    }

    /// Drop every bus and stop the event worker.
    ///
    /// Buses requested afterwards are created anew with empty registrations.
    pub async fn shutdown(&self) {
        self.commands.lock().take();
        self.queries.lock().take();
        let events = self.events.lock().take();
        if let Some(events) = events {
            events.shutdown().await;
        }
        debug!("buses shut down");
    }

    fn message_bus<K: BusKind>(&self, events: Arc<EventBus>) -> Arc<MessageBus<K>> {
        debug!(kind = K::NAME, "bus created");
        Arc::new(
            MessageBus::new(self.container.clone(), events)
                .with_manifest_reader(self.config.manifest_reader()),
        )
    }
}
