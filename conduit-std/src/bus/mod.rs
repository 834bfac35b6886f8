//! Command, query and event buses.
//!
//! - [`CommandBus`] / [`QueryBus`]: one handler per message name, wrapped in
//!   lifecycle events.
//! - [`EventBus`]: any number of listeners per event name, with propagation
//!   control and optional background dispatch.
//! - [`BusFactory`]: creates each bus once and shares the event bus.

mod event_bus;
mod factory;
mod message_bus;
mod worker;

pub use event_bus::{EventBus, ListenerRegistration, WILDCARD};
pub use factory::{AnyBus, BusFactory, EVENT_KIND};
pub use message_bus::{
    AFTER_EXECUTE, BEFORE_EXECUTE, BusKind, COMMAND_KIND, CommandBus, CommandKind, MessageBus,
    NOT_FOUND_MESSAGE, QUERY_KIND, QueryBus, QueryKind,
};
