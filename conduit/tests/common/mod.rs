#![allow(dead_code)]

use conduit::{
    Ack, Arguments, BoxError, Constructible, Container, ContainerBuilder, Event, Handler,
    Instance, Listener, Message, Parameter, TypeRegistry, map_of,
    testing::{EventLog, FailingListener, RecordingListener, StoppingListener},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex},
};

// ============================================================================
// Test Messages
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub sku: String,
    pub quantity: u32,
}

impl Message for CreateOrder {
    fn message_name(&self) -> &'static str {
        "CreateOrder"
    }

    fn to_map(&self) -> Map<String, Value> {
        map_of(self)
    }

    fn validate(&self) -> Result<(), BoxError> {
        if self.quantity == 0 {
            return Err("quantity must be positive".into());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub id: String,
}

impl Message for OrderCreated {
    fn message_name(&self) -> &'static str {
        "OrderCreated"
    }

    fn to_map(&self) -> Map<String, Value> {
        map_of(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountOrders;

impl Message for CountOrders {
    fn message_name(&self) -> &'static str {
        "CountOrders"
    }

    fn to_map(&self) -> Map<String, Value> {
        map_of(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderCount(pub usize);

impl Message for OrderCount {
    fn message_name(&self) -> &'static str {
        "OrderCount"
    }

    fn to_map(&self) -> Map<String, Value> {
        map_of(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Services
// ============================================================================

/// In-memory order storage shared through the container.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<Vec<CreateOrder>>,
}

impl OrderStore {
    pub fn insert(&self, order: CreateOrder) -> usize {
        let mut orders = self.orders.lock().unwrap();
        orders.push(order);
        orders.len()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

impl Constructible for OrderStore {
    const NAME: &'static str = "OrderStore";

    fn construct(_args: &Arguments) -> Result<Self, BoxError> {
        Ok(OrderStore::default())
    }
}

/// A service configured from literals and the environment.
#[derive(Debug)]
pub struct Mailer {
    pub host: String,
    pub port: u16,
}

impl Constructible for Mailer {
    const NAME: &'static str = "Mailer";

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("host"),
            Parameter::new("port").with_default(25),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Mailer {
            host: args.value("host")?,
            port: args.value("port")?,
        })
    }
}

/// A service that depends on other services.
pub struct Notifier {
    pub mailer: Arc<Mailer>,
    pub store: Arc<OrderStore>,
}

impl Constructible for Notifier {
    const NAME: &'static str = "Notifier";

    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::new("mailer"),
            Parameter::typed("store", "OrderStore"),
        ]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(Notifier {
            mailer: args.service("mailer")?,
            store: args.service("store")?,
        })
    }
}

#[derive(Debug)]
pub struct Widget;

impl Constructible for Widget {
    const NAME: &'static str = "Widget";

    fn construct(_args: &Arguments) -> Result<Self, BoxError> {
        Ok(Widget)
    }
}

// ============================================================================
// Handlers and Listeners
// ============================================================================

pub struct OrderHandler {
    store: Arc<OrderStore>,
}

impl Constructible for OrderHandler {
    const NAME: &'static str = "OrderHandler";

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed("store", "OrderStore")]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(OrderHandler {
            store: args.service("store")?,
        })
    }
}

impl Handler for OrderHandler {
    type Message = CreateOrder;
    type Reply = OrderCreated;

    async fn handle(&self, order: &CreateOrder) -> Result<OrderCreated, BoxError> {
        order.validate()?;
        let n = self.store.insert(order.clone());
        Ok(OrderCreated {
            id: format!("order-{n}"),
        })
    }
}

pub struct CountOrdersHandler {
    store: Arc<OrderStore>,
}

impl Constructible for CountOrdersHandler {
    const NAME: &'static str = "CountOrdersHandler";

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed("store", "OrderStore")]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(CountOrdersHandler {
            store: args.service("store")?,
        })
    }
}

impl Handler for CountOrdersHandler {
    type Message = CountOrders;
    type Reply = OrderCount;

    async fn handle(&self, _query: &CountOrders) -> Result<OrderCount, BoxError> {
        Ok(OrderCount(self.store.len()))
    }
}

/// A handler that acknowledges anything it is given.
pub struct AckHandler;

impl Constructible for AckHandler {
    const NAME: &'static str = "AckHandler";

    fn construct(_args: &Arguments) -> Result<Self, BoxError> {
        Ok(AckHandler)
    }
}

impl Handler for AckHandler {
    type Message = CreateOrder;
    type Reply = Ack;

    async fn handle(&self, _order: &CreateOrder) -> Result<Ack, BoxError> {
        Ok(Ack)
    }
}

/// A listener that writes into the event data bag.
pub struct StampListener;

impl Constructible for StampListener {
    const NAME: &'static str = "StampListener";

    fn construct(_args: &Arguments) -> Result<Self, BoxError> {
        Ok(StampListener)
    }
}

impl Listener for StampListener {
    async fn handle(&self, event: &mut Event) -> Result<(), BoxError> {
        event.set("stamped", true);
        Ok(())
    }
}

/// A listener logging `"<source>/<identifier>"` for lifecycle events.
pub struct AuditListener {
    log: Arc<EventLog>,
}

impl Constructible for AuditListener {
    const NAME: &'static str = "AuditListener";

    fn parameters() -> Vec<Parameter> {
        vec![Parameter::typed("event_log", EventLog::NAME)]
    }

    fn construct(args: &Arguments) -> Result<Self, BoxError> {
        Ok(AuditListener {
            log: args.service("event_log")?,
        })
    }
}

impl Listener for AuditListener {
    async fn handle(&self, event: &mut Event) -> Result<(), BoxError> {
        let identifier = event
            .get("identifier")
            .and_then(Value::as_str)
            .unwrap_or_default();
        self.log.record(format!(
            "{}/{identifier}",
            event.source().unwrap_or_default()
        ));
        Ok(())
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Every type used by the integration tests.
pub fn types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types
        .register::<OrderStore>()
        .register::<Mailer>()
        .register::<Notifier>()
        .register::<Widget>()
        .register::<EventLog>()
        .register_handler::<OrderHandler>()
        .register_handler::<CountOrdersHandler>()
        .register_handler::<AckHandler>()
        .register_listener::<StampListener>()
        .register_listener::<AuditListener>()
        .insert(RecordingListener::blueprint("Spy"))
        .insert(RecordingListener::blueprint("First"))
        .insert(RecordingListener::blueprint("Second"))
        .insert(StoppingListener::blueprint("Stopper"))
        .insert(FailingListener::blueprint("Failing"));
    types
}

/// A container with an `OrderStore` service, an event log and a fixed
/// environment.
pub fn container() -> (Container, Arc<EventLog>) {
    let env: HashMap<String, String> =
        HashMap::from([("SMTP_HOST".to_owned(), "mail.example.com".to_owned())]);
    let container = ContainerBuilder::new(types())
        .environment(Arc::new(env))
        .service("OrderStore", conduit::ServiceDefinition::class("OrderStore"))
        .build();
    let log = EventLog::install(&container);
    (container, log)
}

/// The shared order store of `container`.
pub fn store(container: &Container) -> Arc<OrderStore> {
    container
        .resolve::<OrderStore>("OrderStore")
        .expect("order store")
}

/// An instance usable as a pre-built service.
pub fn widget_instance() -> Instance {
    Instance::named("Widget", Widget)
}
