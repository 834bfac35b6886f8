use super::event_bus::EventBus;
use crate::{container::Container, manifest::ManifestReader};
use conduit_core::{BusError, Event, ManifestError, Message};
use parking_lot::RwLock;
use std::{collections::HashMap, fmt, marker::PhantomData, path::Path, sync::Arc};
use tracing::{debug, warn};

/// Returned by [`MessageBus::get_dto_class_from_alias`] when nothing matches.
pub const NOT_FOUND_MESSAGE: &str = "NotFoundMessage";

/// Event dispatched right before a handler runs.
pub const BEFORE_EXECUTE: &str = "before_execute";

/// Event dispatched right after a handler succeeded.
pub const AFTER_EXECUTE: &str = "after_execute";

/// Kind name of the command bus.
pub const COMMAND_KIND: &str = "command";

/// Kind name of the query bus.
pub const QUERY_KIND: &str = "query";

/// Marker for the kind of a [`MessageBus`].
pub trait BusKind: Send + Sync + 'static {
    /// The kind name, also used as the source of lifecycle events.
    const NAME: &'static str;
}

/// Commands change state.
#[derive(Debug, Clone, Copy)]
pub struct CommandKind;

impl BusKind for CommandKind {
    const NAME: &'static str = COMMAND_KIND;
}

/// Queries read state.
#[derive(Debug, Clone, Copy)]
pub struct QueryKind;

impl BusKind for QueryKind {
    const NAME: &'static str = QUERY_KIND;
}

/// Bus for commands.
pub type CommandBus = MessageBus<CommandKind>;

/// Bus for queries.
pub type QueryBus = MessageBus<QueryKind>;

/// Routes each message to the handler class registered for its name.
///
/// Handlers are built through the container's object builder on every
/// `execute`, so the builder memo decides whether the same handler instance
/// is reused. Every execution is wrapped in [`BEFORE_EXECUTE`] and
/// [`AFTER_EXECUTE`] events on the shared [`EventBus`].
pub struct MessageBus<K: BusKind> {
    container: Container,
    events: Arc<EventBus>,
    handlers: RwLock<HashMap<String, String>>,
    aliases: RwLock<HashMap<String, String>>,
    manifests: ManifestReader,
    _kind: PhantomData<fn() -> K>,
}

impl<K: BusKind> MessageBus<K> {
    /// A bus building handlers from `container` and reporting to `events`.
    pub fn new(container: Container, events: Arc<EventBus>) -> Self {
        Self {
            container,
            events,
            handlers: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
            manifests: ManifestReader::new(),
            _kind: PhantomData,
        }
    }

    /// Read handler manifests with `manifests`.
    pub fn with_manifest_reader(mut self, manifests: ManifestReader) -> Self {
        self.manifests = manifests;
        self
    }

    /// The bus kind name.
    pub fn kind(&self) -> &'static str {
        K::NAME
    }

    /// The event bus lifecycle events go to.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Map `identifier` to `handler`, and `cli_alias` to the same handler.
    ///
    /// Registering an identifier again replaces its handler.
    pub fn register(
        &self,
        identifier: impl Into<String>,
        handler: impl Into<String>,
        cli_alias: Option<&str>,
    ) {
        let identifier = identifier.into();
        let handler = handler.into();
        if let Some(alias) = cli_alias {
            self.aliases.write().insert(alias.to_owned(), handler.clone());
        }
        debug!(bus = K::NAME, identifier = %identifier, handler = %handler, "handler registered");
        if let Some(previous) = self.handlers.write().insert(identifier.clone(), handler.clone()) {
            if previous != handler {
                warn!(bus = K::NAME, identifier = %identifier, %previous, "handler replaced");
            }
        }
    }

    /// Whether `identifier` is a registered identifier or alias.
    pub fn has_handler(&self, identifier: &str) -> bool {
        self.aliases.read().contains_key(identifier) || self.handlers.read().contains_key(identifier)
    }

    /// The handler class for `identifier`. Aliases take precedence.
    pub fn get_handler(&self, identifier: &str) -> Result<String, BusError> {
        if let Some(handler) = self.aliases.read().get(identifier) {
            return Ok(handler.clone());
        }
        self.handlers
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| BusError::HandlerNotFound(identifier.to_owned()))
    }

    /// The message identifier whose handler is behind `alias`, or
    /// [`NOT_FOUND_MESSAGE`].
    ///
    /// If several identifiers share that handler the smallest one is returned.
    pub fn get_dto_class_from_alias(&self, alias: &str) -> String {
        let Some(handler) = self.aliases.read().get(alias).cloned() else {
            return NOT_FOUND_MESSAGE.to_owned();
        };
        self.handlers
            .read()
            .iter()
            .filter(|(_, class)| **class == handler)
            .map(|(identifier, _)| identifier)
            .min()
            .cloned()
            .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_owned())
    }

    /// Registered `(identifier, handler)` pairs, sorted by identifier.
    pub fn handlers(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .handlers
            .read()
            .iter()
            .map(|(identifier, handler)| (identifier.clone(), handler.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Registered `(alias, handler)` pairs, sorted by alias.
    pub fn aliases(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .aliases
            .read()
            .iter()
            .map(|(alias, handler)| (alias.clone(), handler.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Run the handler registered for `message` and return its reply.
    ///
    /// A failing handler skips [`AFTER_EXECUTE`].
    pub async fn execute(&self, message: &dyn Message) -> Result<Box<dyn Message>, BusError> {
        let identifier = message.message_name();
        let class = self.get_handler(identifier)?;

        let instance = self
            .container
            .builder()
            .build(&self.container, &class, &[])
            .map_err(|source| BusError::Build {
                class: class.clone(),
                source,
            })?;
        let handler = instance
            .as_handler()
            .ok_or_else(|| BusError::NotAHandler(class.clone()))?;

        self.events.dispatch(self.lifecycle(BEFORE_EXECUTE, identifier)).await?;
        debug!(bus = K::NAME, identifier, handler = %class, "executing");
        let reply = handler
            .handle_dyn(message)
            .await
            .map_err(|source| BusError::Handler {
                identifier: identifier.to_owned(),
                source,
            })?;
        self.events.dispatch(self.lifecycle(AFTER_EXECUTE, identifier)).await?;

        Ok(reply)
    }

    /// Load a handler manifest. Returns the number of handlers registered.
    pub fn load_handlers_from_json_file(&self, path: impl AsRef<Path>) -> Result<usize, ManifestError> {
        self.manifests.load_handlers(self, path.as_ref())
    }

    fn lifecycle(&self, name: &str, identifier: &str) -> Event {
        Event::new(name)
            .with_source(K::NAME)
            .with("identifier", identifier)
    }
}

impl<K: BusKind> fmt::Debug for MessageBus<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("kind", &K::NAME)
            .field("handlers", &self.handlers.read().len())
            .field("aliases", &self.aliases.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;
    use conduit_core::{Ack, Arguments, BoxError, Constructible, Handler};
    use serde_json::{Map, Value};
    use std::{
        any::Any,
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    struct Ping(u32);

    impl Message for Ping {
        fn message_name(&self) -> &'static str {
            "Ping"
        }

        fn to_map(&self) -> Map<String, Value> {
            Map::from_iter([("n".to_owned(), Value::from(self.0))])
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    struct PingHandler;

    impl Constructible for PingHandler {
        const NAME: &'static str = "PingHandler";

        fn construct(_args: &Arguments) -> Result<Self, BoxError> {
            Ok(PingHandler)
        }
    }

    impl Handler for PingHandler {
        type Message = Ping;
        type Reply = Ack;

        async fn handle(&self, message: &Ping) -> Result<Ack, BoxError> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            if message.0 == 0 {
                return Err("zero".into());
            }
            Ok(Ack)
        }
    }

    struct NotAHandler;

    impl Constructible for NotAHandler {
        const NAME: &'static str = "NotAHandler";

        fn construct(_args: &Arguments) -> Result<Self, BoxError> {
            Ok(NotAHandler)
        }
    }

    fn bus() -> CommandBus {
        let mut types = TypeRegistry::new();
        types.register_handler::<PingHandler>().register::<NotAHandler>();
        let container = Container::new(types);
        let events = Arc::new(EventBus::new(container.clone()));
        CommandBus::new(container, events)
    }

    #[test]
    fn test_registration_lookups() {
        let bus = bus();
        assert_eq!(bus.kind(), "command");
        bus.register("Ping", "PingHandler", Some("ping"));

        assert!(bus.has_handler("Ping"));
        assert!(bus.has_handler("ping"));
        assert!(!bus.has_handler("Pong"));
        assert_eq!(bus.get_handler("ping").unwrap(), "PingHandler");
        assert!(matches!(bus.get_handler("Pong"), Err(BusError::HandlerNotFound(_))));

        assert_eq!(bus.get_dto_class_from_alias("ping"), "Ping");
        assert_eq!(bus.get_dto_class_from_alias("pong"), NOT_FOUND_MESSAGE);
        assert_eq!(
            bus.handlers(),
            vec![("Ping".to_owned(), "PingHandler".to_owned())]
        );
        assert_eq!(bus.aliases().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_errors() {
        let bus = bus();
        assert!(matches!(
            bus.execute(&Ping(1)).await,
            Err(BusError::HandlerNotFound(_))
        ));

        bus.register("Ping", "NotAHandler", None);
        assert!(matches!(
            bus.execute(&Ping(1)).await,
            Err(BusError::NotAHandler(_))
        ));

        bus.register("Ping", "PingHandler", None);
        let before = CALLS.load(Ordering::SeqCst);
        assert!(matches!(
            bus.execute(&Ping(0)).await,
            Err(BusError::Handler { .. })
        ));
        assert_eq!(CALLS.load(Ordering::SeqCst), before + 1);

        let reply = bus.execute(&Ping(2)).await.unwrap();
        assert!(reply.is::<Ack>());
    }
}
