//! # conduit-std
//!
//! Standard implementations for the Conduit service container and message buses.
//!
//! This crate provides:
//! - **Types**: [`TypeRegistry`] of constructible classes and factory methods
//! - **Building**: [`ObjectBuilder`] with dependency resolution and memoization
//! - **Services**: [`Container`] and [`ContainerBuilder`]
//! - **Buses**: [`CommandBus`], [`QueryBus`], [`EventBus`], [`BusFactory`]
//! - **Manifests**: [`ManifestReader`] with glob expansion
//! - **Caching**: [`MemoryCache`]
//! - **Configuration**: [`ConduitConfig`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use conduit_core;

// Modules
pub mod builder;
pub mod bus;
pub mod cache;
pub mod config;
pub mod container;
pub mod env;
pub mod keys;
pub mod manifest;
pub mod testing;
pub mod types;

pub use builder::ObjectBuilder;
pub use bus::{AnyBus, BusFactory, BusKind, CommandBus, EventBus, MessageBus, QueryBus};
pub use cache::MemoryCache;
pub use config::{ConduitConfig, ConfigError, RuntimeContext};
pub use container::{Container, ContainerBuilder};
pub use env::{Environment, ProcessEnvironment};
pub use manifest::{ActiveModules, AllModules, ManifestReader, ModuleFilter};
pub use types::TypeRegistry;

#[cfg(feature = "inventory")]
pub use inventory;
#[cfg(feature = "inventory")]
pub use types::CollectedType;
