//! # conduit - Service Container and Message Buses
//!
//! `conduit` pairs a dependency container with a command/query/event bus
//! family. Handlers and listeners are registered by class name, built on
//! demand by the object builder, and fed their collaborators from the
//! container.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize, Message)]
//! struct CreateOrder { sku: String }
//!
//! struct CreateOrderHandler;
//!
//! impl Constructible for CreateOrderHandler {
//!     const NAME: &'static str = "CreateOrderHandler";
//!     fn construct(_: &Arguments) -> Result<Self, BoxError> { Ok(Self) }
//! }
//!
//! impl Handler for CreateOrderHandler {
//!     type Message = CreateOrder;
//!     type Reply = Ack;
//!     async fn handle(&self, order: &CreateOrder) -> Result<Ack, BoxError> { Ok(Ack) }
//! }
//!
//! let mut types = TypeRegistry::new();
//! types.register_handler::<CreateOrderHandler>();
//!
//! let buses = BusFactory::new(Container::new(types), ConduitConfig::from_env());
//! let commands = buses.command_bus();
//! commands.register("CreateOrder", "CreateOrderHandler", Some("order:create"));
//! commands.execute(&CreateOrder { sku: "A-1".into() }).await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod telemetry;

pub use conduit_core::{
    // Messages
    Ack,
    // Building
    Argument,
    Arguments,
    Blueprint,
    // Errors
    BoxError,
    BuildError,
    BusError,
    // Cache
    Cache,
    ConduitError,
    Constructible,
    ContainerError,
    DynHandler,
    DynListener,
    Event,
    FactoryMethod,
    FromMap,
    // Handler / Listener
    Handler,
    Instance,
    Listener,
    ManifestError,
    Message,
    Parameter,
    Resolved,
    ServiceDefinition,
    Ttl,
    map_of,
};

// Container
pub use conduit_std::{
    Container, ContainerBuilder, MemoryCache, ObjectBuilder, TypeRegistry,
    env::{Environment, ProcessEnvironment},
};

// Buses
pub use conduit_std::bus::{
    AFTER_EXECUTE, AnyBus, BEFORE_EXECUTE, BusFactory, BusKind, CommandBus, EventBus,
    ListenerRegistration, MessageBus, NOT_FOUND_MESSAGE, QueryBus, WILDCARD,
};

// Configuration and manifests
pub use conduit_std::{
    config::{ConduitConfig, ConfigError, RuntimeContext},
    manifest::{ActiveModules, AllModules, ManifestReader, ModuleFilter},
};

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use conduit_std::testing::*;
}

/// Prelude module - common imports for Conduit.
///
/// # Usage
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Ack, Arguments, BoxError, BusFactory, CommandBus, ConduitConfig, Constructible, Container,
        Event, EventBus, Handler, Listener, Message, Parameter, QueryBus, ServiceDefinition,
        TypeRegistry,
    };
}

#[cfg(feature = "macros")]
pub use conduit_macros::Message;

#[cfg(feature = "inventory")]
pub use conduit_std::{CollectedType, inventory};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
