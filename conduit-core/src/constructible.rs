//! Explicit dependency declarations.
//!
//! There is no runtime reflection in Rust, so every type the object builder
//! can create declares its constructor up front: an ordered parameter list and
//! a function taking the resolved [`Arguments`].

use crate::{
    argument::{Arguments, Parameter},
    error::BoxError,
    handler::Handler,
    instance::Instance,
    listener::Listener,
};
use std::{any::Any, fmt, sync::Arc};

/// A type the object builder can construct by name.
///
/// # Example
///
/// ```rust,ignore
/// struct OrderHandler { repo: Arc<OrderRepository>, retries: u32 }
///
/// impl Constructible for OrderHandler {
///     const NAME: &'static str = "OrderHandler";
///
///     fn parameters() -> Vec<Parameter> {
///         vec![
///             Parameter::typed("repo", "OrderRepository"),
///             Parameter::new("retries").with_default(3),
///         ]
///     }
///
///     fn construct(args: &Arguments) -> Result<Self, BoxError> {
///         Ok(Self { repo: args.service("repo")?, retries: args.value("retries")? })
///     }
/// }
/// ```
pub trait Constructible: Send + Sync + Sized + 'static {
    /// The class name used in definitions and manifests.
    const NAME: &'static str;

    /// Declared constructor parameters, in order. Empty means "no constructor".
    fn parameters() -> Vec<Parameter> {
        Vec::new()
    }

    /// Build the value from resolved arguments.
    fn construct(args: &Arguments) -> Result<Self, BoxError>;
}

type ConstructFn = Arc<dyn Fn(&Arguments) -> Result<Instance, BoxError> + Send + Sync>;

/// Registration record of one constructible (or abstract) type.
#[derive(Clone)]
pub struct Blueprint {
    name: &'static str,
    parameters: Vec<Parameter>,
    constructor: Option<ConstructFn>,
}

impl Blueprint {
    /// Blueprint of a plain service type.
    pub fn of<T: Constructible>() -> Self {
        Self::new(T::NAME, T::parameters(), |args| {
            T::construct(args).map(|value| Instance::named(T::NAME, value))
        })
    }

    /// Blueprint of a command/query handler.
    pub fn handler<T: Constructible + Handler>() -> Self {
        Self::new(T::NAME, T::parameters(), |args| {
            T::construct(args).map(|value| Instance::handler(T::NAME, value))
        })
    }

    /// Blueprint of an event listener.
    pub fn listener<T: Constructible + Listener>() -> Self {
        Self::new(T::NAME, T::parameters(), |args| {
            T::construct(args).map(|value| Instance::listener(T::NAME, value))
        })
    }

    /// A known type that cannot be instantiated (an interface or abstract class).
    ///
    /// It still counts as a known type for parameter type matching.
    pub fn abstract_type(name: &'static str) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            constructor: None,
        }
    }

    /// A blueprint with a custom constructor.
    pub fn new<F>(name: &'static str, parameters: Vec<Parameter>, constructor: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self {
            name,
            parameters,
            constructor: Some(Arc::new(constructor)),
        }
    }

    /// The registered class name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameters, in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Whether [`Blueprint::construct`] can succeed.
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Run the constructor. `None` for abstract types.
    pub fn construct(&self, args: &Arguments) -> Option<Result<Instance, BoxError>> {
        self.constructor.as_ref().map(|constructor| constructor(args))
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// A factory method (`class::method`) that produces an object.
#[derive(Clone)]
pub struct FactoryMethod {
    parameters: Vec<Parameter>,
    is_static: bool,
    invoke: ConstructFn,
}

impl FactoryMethod {
    /// A static factory returning `T`.
    pub fn new<T, F>(parameters: Vec<Parameter>, invoke: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self::returning_instance(parameters, move |args| invoke(args).map(Instance::new))
    }

    /// A static factory that builds the [`Instance`] itself, e.g. to attach a
    /// handler capability or a custom type name.
    pub fn returning_instance<F>(parameters: Vec<Parameter>, invoke: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            is_static: true,
            invoke: Arc::new(invoke),
        }
    }

    /// Mark the method as needing a receiver. Such factories are known but
    /// rejected by the builder.
    pub fn non_static(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Declared parameters, in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Whether the factory can be called without a receiver.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Number of parameters without a default.
    pub fn required_parameters(&self) -> usize {
        self.parameters.iter().filter(|p| !p.is_optional()).count()
    }

    /// Call the factory.
    pub fn invoke(&self, args: &Arguments) -> Result<Instance, BoxError> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("parameters", &self.parameters)
            .field("is_static", &self.is_static)
            .finish()
    }
}
