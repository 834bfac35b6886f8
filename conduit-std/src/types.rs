//! Registry of constructible types and factory methods.

use conduit_core::{Blueprint, Constructible, FactoryMethod, Handler, Listener};
use std::collections::HashMap;

/// Every type the object builder can create by name.
///
/// Built once at startup and then shared read-only by the builder.
///
/// # Example
/// ```ignore
/// let mut types = TypeRegistry::new();
/// types
///     .register::<Mailer>()
///     .register_handler::<CreateOrderHandler>()
///     .register_abstract("LoggerInterface");
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    blueprints: HashMap<&'static str, Blueprint>,
    factories: HashMap<(String, String), FactoryMethod>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain service type.
    pub fn register<T: Constructible>(&mut self) -> &mut Self {
        self.insert(Blueprint::of::<T>())
    }

    /// Register a command or query handler type.
    pub fn register_handler<T: Constructible + Handler>(&mut self) -> &mut Self {
        self.insert(Blueprint::handler::<T>())
    }

    /// Register an event listener type.
    pub fn register_listener<T: Constructible + Listener>(&mut self) -> &mut Self {
        self.insert(Blueprint::listener::<T>())
    }

    /// Register a known type that cannot be instantiated.
    pub fn register_abstract(&mut self, name: &'static str) -> &mut Self {
        self.insert(Blueprint::abstract_type(name))
    }

    /// Register a blueprint. A later blueprint with the same name replaces
    /// the earlier one.
    pub fn insert(&mut self, blueprint: Blueprint) -> &mut Self {
        self.blueprints.insert(blueprint.name(), blueprint);
        self
    }

    /// Register a factory method `class::method`.
    pub fn register_factory(
        &mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        factory: FactoryMethod,
    ) -> &mut Self {
        self.factories.insert((class.into(), method.into()), factory);
        self
    }

    /// Look up a blueprint by class name.
    pub fn blueprint(&self, name: &str) -> Option<&Blueprint> {
        self.blueprints.get(name)
    }

    /// Look up a factory method.
    pub fn factory(&self, class: &str, method: &str) -> Option<&FactoryMethod> {
        self.factories.get(&(class.to_owned(), method.to_owned()))
    }

    /// Whether `name` is a registered class or interface.
    pub fn contains(&self, name: &str) -> bool {
        self.blueprints.contains_key(name)
    }

    /// Get the number of registered types.
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Check if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

/// A registration function collected at link time.
///
/// ```ignore
/// inventory::submit! {
///     CollectedType::new(|types| { types.register_handler::<CreateOrderHandler>(); })
/// }
/// ```
#[cfg(feature = "inventory")]
pub struct CollectedType {
    register: fn(&mut TypeRegistry),
}

#[cfg(feature = "inventory")]
impl CollectedType {
    /// Wrap a registration function.
    pub const fn new(register: fn(&mut TypeRegistry)) -> Self {
        Self { register }
    }
}

#[cfg(feature = "inventory")]
inventory::collect!(CollectedType);

#[cfg(feature = "inventory")]
impl TypeRegistry {
    /// A registry populated from every submitted [`CollectedType`].
    pub fn collected() -> Self {
        let mut types = Self::new();
        for entry in inventory::iter::<CollectedType> {
            (entry.register)(&mut types);
        }
        types
    }
}
