//! Object builder: creates objects by class name and injects their
//! declared dependencies.

use crate::{
    container::Container,
    env::{Environment, ProcessEnvironment},
    keys::{self, CONSTRUCTOR},
    types::TypeRegistry,
};
use conduit_core::{
    Argument, Arguments, BuildError, Instance, Parameter, Resolved, ServiceDefinition,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, trace};

/// Builds objects from registered blueprints and factory methods.
///
/// Every successful build is memoized on its `(class, method, arguments)`
/// key, so building the same thing twice from one builder returns the same
/// instance. The memo belongs to this builder only; a fresh builder starts
/// empty.
///
/// # Parameter resolution
///
/// For each declared parameter, in order:
///
/// 1. a positional argument at that position (literal, `ENV.` or `@service`),
/// 2. a container service named like the parameter,
/// 3. a container service named like the parameter's declared type, if that
///    type is registered,
/// 4. the parameter default,
/// 5. otherwise [`BuildError::UnresolvedDependency`].
pub struct ObjectBuilder {
    types: Arc<TypeRegistry>,
    environment: Arc<dyn Environment>,
    memo: Mutex<HashMap<String, Instance>>,
}

impl ObjectBuilder {
    /// Create a builder over `types`, reading `ENV.` arguments from the
    /// process environment.
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types: Arc::new(types),
            environment: Arc::new(ProcessEnvironment),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Answer `ENV.` arguments from another source.
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// The registered types.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// A builder sharing types and environment but with an empty memo.
    pub fn fresh(&self) -> Self {
        Self {
            types: self.types.clone(),
            environment: self.environment.clone(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Build `class` with positional `arguments`.
    pub fn build(
        &self,
        container: &Container,
        class: &str,
        arguments: &[Argument],
    ) -> Result<Instance, BuildError> {
        let key = keys::build_key(class, CONSTRUCTOR, arguments);
        if let Some(hit) = self.memoized(&key) {
            trace!(class, "build memo hit");
            return Ok(hit);
        }

        let blueprint = self
            .types
            .blueprint(class)
            .ok_or_else(|| BuildError::UnknownType(class.to_owned()))?;
        if !blueprint.is_instantiable() {
            return Err(BuildError::NotInstantiable(class.to_owned()));
        }

        let resolved = if blueprint.parameters().is_empty() {
            Arguments::new()
        } else {
            self.resolve_parameters(container, class, blueprint.parameters(), arguments)?
        };

        let instance = match blueprint.construct(&resolved) {
            Some(Ok(instance)) => instance,
            Some(Err(source)) => {
                return Err(BuildError::Construct {
                    class: class.to_owned(),
                    source,
                });
            }
            None => return Err(BuildError::NotInstantiable(class.to_owned())),
        };

        debug!(class, "object built");
        Ok(self.remember(key, instance))
    }

    /// Call the static factory `class::method` with positional `arguments`.
    pub fn build_from_factory(
        &self,
        container: &Container,
        class: &str,
        method: &str,
        arguments: &[Argument],
    ) -> Result<Instance, BuildError> {
        let key = keys::build_key(class, method, arguments);
        if let Some(hit) = self.memoized(&key) {
            trace!(class, method, "factory memo hit");
            return Ok(hit);
        }

        let factory =
            self.types
                .factory(class, method)
                .ok_or_else(|| BuildError::UnknownFactory {
                    class: class.to_owned(),
                    method: method.to_owned(),
                })?;
        if !factory.is_static() {
            return Err(BuildError::NotStatic {
                class: class.to_owned(),
                method: method.to_owned(),
            });
        }
        let required = factory.required_parameters();
        if arguments.len() < required {
            return Err(BuildError::MissingArguments {
                class: class.to_owned(),
                method: method.to_owned(),
                required,
                given: arguments.len(),
            });
        }

        let resolved = self.resolve_parameters(container, class, factory.parameters(), arguments)?;
        let instance = factory
            .invoke(&resolved)
            .map_err(|source| BuildError::Construct {
                class: format!("{class}::{method}"),
                source,
            })?;

        debug!(class, method, "object built by factory");
        Ok(self.remember(key, instance))
    }

    /// Build from a declarative definition.
    ///
    /// Class and factory definitions are built here; aliases and the
    /// container self-reference are handed back to the container.
    pub fn build_from_definition(
        &self,
        container: &Container,
        definition: &ServiceDefinition,
    ) -> Result<Instance, BuildError> {
        match definition {
            ServiceDefinition::Class { class, arguments } => self.build(container, class, arguments),
            ServiceDefinition::Factory {
                class,
                method,
                arguments,
            } => self.build_from_factory(container, class, method, arguments),
            ServiceDefinition::Instance(instance) => Ok(instance.clone()),
            ServiceDefinition::Alias(target) => self.service(container, target),
            ServiceDefinition::SelfReference => Ok(container.as_instance()),
        }
    }

    /// Get the number of memoized builds.
    pub fn memoized_len(&self) -> usize {
        self.memo.lock().len()
    }

    /// Forget every memoized build.
    pub fn clear(&self) {
        self.memo.lock().clear();
    }

    fn memoized(&self, key: &str) -> Option<Instance> {
        self.memo.lock().get(key).cloned()
    }

    // The memo lock is never held while building: constructors may recurse
    // into the container and back into this builder. If two builds raced,
    // the first stored instance wins.
    fn remember(&self, key: String, instance: Instance) -> Instance {
        self.memo.lock().entry(key).or_insert(instance).clone()
    }

    fn resolve_parameters(
        &self,
        container: &Container,
        class: &str,
        parameters: &[Parameter],
        arguments: &[Argument],
    ) -> Result<Arguments, BuildError> {
        let mut resolved = Arguments::new();
        for (position, parameter) in parameters.iter().enumerate() {
            let value = if let Some(argument) = arguments.get(position) {
                self.resolve_argument(container, argument)?
            } else if container.has(parameter.name()) {
                Resolved::Service(self.service(container, parameter.name())?)
            } else if let Some(type_name) = parameter
                .type_name()
                .filter(|ty| self.types.contains(ty) && container.has(ty))
            {
                Resolved::Service(self.service(container, type_name)?)
            } else if let Some(default) = parameter.default() {
                Resolved::Value(default.clone())
            } else {
                return Err(BuildError::UnresolvedDependency {
                    class: class.to_owned(),
                    parameter: parameter.name().to_owned(),
                });
            };
            resolved.push(parameter.name(), value);
        }
        Ok(resolved)
    }

    fn resolve_argument(
        &self,
        container: &Container,
        argument: &Argument,
    ) -> Result<Resolved, BuildError> {
        match argument {
            Argument::Literal(value) => Ok(Resolved::Value(value.clone())),
            Argument::Env(name) => self
                .environment
                .var(name)
                .map(|value| Resolved::Value(Value::String(value)))
                .ok_or_else(|| BuildError::MissingEnvironmentVariable(name.clone())),
            Argument::Service(id) => self.service(container, id).map(Resolved::Service),
        }
    }

    fn service(&self, container: &Container, id: &str) -> Result<Instance, BuildError> {
        container.get(id).map_err(|source| BuildError::Service {
            id: id.to_owned(),
            source: Box::new(source),
        })
    }
}

impl fmt::Debug for ObjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBuilder")
            .field("types", &self.types.len())
            .field("memoized", &self.memoized_len())
            .finish()
    }
}
