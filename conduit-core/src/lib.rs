//! # conduit-core
//!
//! Core contracts for the Conduit service container and message buses.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! modules that only declare handlers, listeners and services, without
//! pulling in the `conduit-std` implementations.
//!
//! # Building Blocks
//!
//! ## Messages ([`Message`], [`Event`])
//!
//! DTOs exchanged with handlers. A bus finds the handler of a message by its
//! [`Message::message_name`]. Events are messages too, and additionally carry
//! a mutable data bag and a propagation flag.
//!
//! ## Endpoints ([`Handler`], [`Listener`])
//!
//! Handlers answer commands and queries; listeners react to events. Both use
//! native `async fn` and have object-safe `Dyn*` counterparts used by the
//! buses.
//!
//! ## Construction ([`Constructible`], [`Blueprint`], [`FactoryMethod`])
//!
//! Explicit dependency declarations that let the object builder create
//! objects by class name and inject their collaborators.
//!
//! ## Definitions ([`ServiceDefinition`], [`Argument`])
//!
//! What the container knows about a service id, parsed once from manifests.
//!
//! # Error Types
//!
//! - [`ConduitError`] - Top-level error type
//! - [`ContainerError`] - Service resolution errors
//! - [`BuildError`] - Object construction errors
//! - [`BusError`] - Bus and dispatch errors
//! - [`ManifestError`] - Manifest loading errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod argument;
mod cache;
mod constructible;
mod definition;
mod error;
mod event;
mod handler;
mod instance;
mod listener;
mod message;

// Re-exports
pub use argument::{Argument, Arguments, ENV_PREFIX, Parameter, Resolved, SERVICE_SIGIL};
pub use cache::{Cache, Ttl};
pub use constructible::{Blueprint, Constructible, FactoryMethod};
pub use definition::ServiceDefinition;
pub use error::{BoxError, BuildError, BusError, ConduitError, ContainerError, ManifestError};
pub use event::Event;
pub use handler::{DynHandler, Handler};
pub use instance::Instance;
pub use listener::{DynListener, Listener};
pub use message::{Ack, FromMap, Message, map_of};
