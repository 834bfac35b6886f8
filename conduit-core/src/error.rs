//! Error types for Conduit.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`ConduitError`] - Top-level error type for all Conduit operations
//! - [`ContainerError`] - Errors raised while resolving services
//! - [`BuildError`] - Errors raised by the object builder
//! - [`BusError`] - Errors raised by the command, query and event buses
//! - [`ManifestError`] - Errors raised while loading declarative manifests

use std::path::PathBuf;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Conduit operations.
#[derive(Error, Debug)]
pub enum ConduitError {
    /// An error occurred while resolving a service.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// An error occurred while building an object.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// An error occurred on a bus.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// An error occurred while loading a manifest.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised by the service container.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// The service could not be resolved. Wraps whatever failed underneath.
    #[error("service `{id}` not found")]
    ServiceNotFound {
        /// The requested service id.
        id: String,
        /// The original failure.
        #[source]
        source: Box<ConduitError>,
    },

    /// A definition was rejected at registration time.
    #[error("invalid service definition for `{id}`: {reason}")]
    InvalidServiceDefinition {
        /// The service id the definition was registered under.
        id: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// The service resolved, but to a different type than requested.
    #[error("service `{id}` is a `{actual}`, not a `{expected}`")]
    TypeMismatch {
        /// The requested service id.
        id: String,
        /// The requested Rust type.
        expected: &'static str,
        /// The type name recorded on the instance.
        actual: &'static str,
    },
}

impl ContainerError {
    /// Wraps any failure into [`ContainerError::ServiceNotFound`].
    pub fn not_found(id: impl Into<String>, source: impl Into<ConduitError>) -> Self {
        Self::ServiceNotFound {
            id: id.into(),
            source: Box::new(source.into()),
        }
    }
}

/// Errors raised while building objects.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No blueprint is registered under the class name.
    #[error("type `{0}` is not registered")]
    UnknownType(String),

    /// The class is abstract and cannot be constructed.
    #[error("type `{0}` cannot be instantiated")]
    NotInstantiable(String),

    /// A constructor or factory parameter could not be satisfied.
    #[error("unresolved dependency `{parameter}` of `{class}`")]
    UnresolvedDependency {
        /// The class being built.
        class: String,
        /// The parameter that could not be resolved.
        parameter: String,
    },

    /// No factory method is registered for the class.
    #[error("no factory `{class}::{method}` is registered")]
    UnknownFactory {
        /// The factory class.
        class: String,
        /// The factory method.
        method: String,
    },

    /// The factory method cannot be called in a static context.
    #[error("`{class}::{method}` is not callable statically")]
    NotStatic {
        /// The factory class.
        class: String,
        /// The factory method.
        method: String,
    },

    /// The factory was given fewer arguments than it requires.
    #[error("`{class}::{method}` requires {required} arguments, {given} given")]
    MissingArguments {
        /// The factory class.
        class: String,
        /// The factory method.
        method: String,
        /// Number of parameters without a default.
        required: usize,
        /// Number of arguments supplied.
        given: usize,
    },

    /// An `ENV.` argument referenced an unset variable.
    #[error("environment variable `{0}` is not set")]
    MissingEnvironmentVariable(String),

    /// A service argument could not be resolved by the container.
    #[error("service argument `{id}` could not be resolved")]
    Service {
        /// The referenced service id.
        id: String,
        /// The container failure.
        #[source]
        source: Box<ContainerError>,
    },

    /// The constructor or factory body itself failed.
    #[error("constructing `{class}` failed")]
    Construct {
        /// The class being built.
        class: String,
        /// The constructor failure.
        #[source]
        source: BoxError,
    },
}

/// Errors raised by the bus family.
#[derive(Error, Debug)]
pub enum BusError {
    /// No handler (direct or aliased) is mapped to the identifier.
    #[error("no handler registered for `{0}`")]
    HandlerNotFound(String),

    /// A bus factory was asked for an unknown bus kind.
    #[error("unknown bus type `{0}`")]
    InvalidBusType(String),

    /// The built handler class does not implement `Handler`.
    #[error("`{0}` is not a message handler")]
    NotAHandler(String),

    /// The built listener class does not implement `Listener`.
    #[error("`{0}` is not an event listener")]
    NotAListener(String),

    /// A handler received a message of another type.
    #[error("handler expected `{expected}`, received `{actual}`")]
    MessageMismatch {
        /// The message type the handler accepts.
        expected: &'static str,
        /// The message name that was dispatched.
        actual: String,
    },

    /// The handler failed.
    #[error("handler for `{identifier}` failed")]
    Handler {
        /// The message identifier being executed.
        identifier: String,
        /// The handler failure.
        #[source]
        source: BoxError,
    },

    /// A listener failed. Remaining listeners of the dispatch were skipped.
    #[error("listener `{listener}` failed on `{event}`")]
    Listener {
        /// The event identifier being dispatched.
        event: String,
        /// The listener class.
        listener: String,
        /// The listener failure.
        #[source]
        source: BoxError,
    },

    /// A handler or listener could not be built.
    #[error("failed to build `{class}`")]
    Build {
        /// The handler or listener class.
        class: String,
        /// The builder failure.
        #[source]
        source: BuildError,
    },

    /// The background dispatch worker could not accept the event.
    #[error("dispatch worker unavailable: {0}")]
    WorkerUnavailable(String),
}

/// Errors raised while reading manifests.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {}", .path.display())]
    Io {
        /// The manifest path.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("failed to parse manifest {}", .path.display())]
    Parse {
        /// The manifest path.
        path: PathBuf,
        /// The JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest is valid JSON but has an unexpected shape.
    #[error("malformed manifest {}: {reason}", .path.display())]
    Shape {
        /// The manifest path.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },

    /// A glob entry has an invalid pattern.
    #[error("invalid glob pattern `{0}`")]
    InvalidGlob(String),

    /// Directory traversal failed while expanding a glob.
    #[error("failed to expand glob `{pattern}`: {reason}")]
    Walk {
        /// The glob pattern.
        pattern: String,
        /// The traversal failure.
        reason: String,
    },

    /// A service entry was rejected by the container.
    #[error(transparent)]
    Definition(#[from] ContainerError),
}

// Convenience conversions
impl From<BoxError> for ConduitError {
    fn from(err: BoxError) -> Self {
        ConduitError::Custom(err)
    }
}
