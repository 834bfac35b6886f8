//! Service container: named, lazily built, cached services.

use crate::{
    builder::ObjectBuilder,
    cache::MemoryCache,
    config::ConduitConfig,
    env::Environment,
    keys,
    manifest::ManifestReader,
    types::TypeRegistry,
};
use conduit_core::{
    Cache, ConduitError, ContainerError, Instance, ManifestError, ServiceDefinition, Ttl,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::{any::Any, collections::HashMap, fmt, path::Path, sync::Arc};
use tracing::{debug, trace};

/// Service id under which the container resolves to itself.
pub const CONTAINER_ID: &str = "container";

/// Type name under which the container resolves to itself.
pub const CONTAINER_TYPE: &str = "conduit::Container";

// ============================================================================
// Container
// ============================================================================

/// Registers and resolves named services.
///
/// Cloning is cheap: clones share definitions, cache and builder.
///
/// Resolution order for [`Container::get`]:
///
/// 1. `"container"` and `"conduit::Container"` resolve to the container.
/// 2. A cached instance under the service key is returned as is.
/// 3. Otherwise the definition is resolved: class and factory definitions are
///    built, aliases are followed, instances are returned. An id with no
///    definition is built as a class of that name.
/// 4. The result is cached before it is returned.
///
/// Every failure comes back as [`ContainerError::ServiceNotFound`] wrapping
/// the original error.
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    definitions: RwLock<HashMap<String, ServiceDefinition>>,
    cache: Arc<dyn Cache<Instance>>,
    ttl: Option<Ttl>,
    builder: ObjectBuilder,
    manifests: ManifestReader,
}

impl Container {
    /// A container over `types` with default settings.
    pub fn new(types: TypeRegistry) -> Self {
        ContainerBuilder::new(types).build()
    }

    /// Start configuring a container.
    pub fn builder_for(types: TypeRegistry) -> ContainerBuilder {
        ContainerBuilder::new(types)
    }

    /// Register `definition` under `id`.
    ///
    /// The first registration of an id wins; later ones are ignored. The
    /// self-reference ids are reserved.
    pub fn set(
        &self,
        id: impl Into<String>,
        definition: ServiceDefinition,
    ) -> Result<(), ContainerError> {
        let id = id.into();
        if matches!(definition, ServiceDefinition::SelfReference) {
            return Err(ContainerError::InvalidServiceDefinition {
                id,
                reason: "self references cannot be registered".to_owned(),
            });
        }

        let mut definitions = self.inner.definitions.write();
        match definitions.get(&id) {
            Some(ServiceDefinition::SelfReference) => {
                Err(ContainerError::InvalidServiceDefinition {
                    id,
                    reason: "the id is reserved for the container".to_owned(),
                })
            }
            Some(_) => {
                debug!(id = %id, "service already defined, keeping the first definition");
                Ok(())
            }
            None => {
                debug!(id = %id, "service defined");
                definitions.insert(id, definition);
                Ok(())
            }
        }
    }

    /// Register a definition written in manifest JSON.
    pub fn set_json(&self, id: impl Into<String>, value: &Value) -> Result<(), ContainerError> {
        let id = id.into();
        let definition = ServiceDefinition::from_json(&id, value)?;
        self.set(id, definition)
    }

    /// Register a pre-built object.
    pub fn set_instance(&self, id: impl Into<String>, instance: Instance) -> Result<(), ContainerError> {
        self.set(id, ServiceDefinition::Instance(instance))
    }

    /// Check if `id` is defined or already cached.
    pub fn has(&self, id: &str) -> bool {
        self.inner.definitions.read().contains_key(id)
            || self.inner.cache.has(&keys::service_key(id))
    }

    /// Resolve the service `id`.
    pub fn get(&self, id: &str) -> Result<Instance, ContainerError> {
        let definition = self.inner.definitions.read().get(id).cloned();
        if let Some(ServiceDefinition::SelfReference) = definition {
            return Ok(self.as_instance());
        }

        let key = keys::service_key(id);
        if let Some(hit) = self.inner.cache.get(&key) {
            trace!(id, "service cache hit");
            return Ok(hit);
        }

        let instance = self
            .resolve_definition(id, definition)
            .map_err(|source| ContainerError::not_found(id, source))?;
        self.inner.cache.set(&key, instance.clone(), self.inner.ttl);
        debug!(id, type_name = instance.type_name(), "service resolved");
        Ok(instance)
    }

    /// Resolve the service `id` as `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.get(id)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| ContainerError::TypeMismatch {
                id: id.to_owned(),
                expected: std::any::type_name::<T>(),
                actual: instance.type_name(),
            })
    }

    /// All defined service ids, sorted.
    pub fn definitions(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.definitions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Load a service manifest and register every entry.
    ///
    /// Returns the number of entries read.
    pub fn load_services_from_json_file(&self, path: impl AsRef<Path>) -> Result<usize, ManifestError> {
        self.inner.manifests.load_services(self, path.as_ref())
    }

    /// The object builder used for undefined ids and class definitions.
    pub fn builder(&self) -> &ObjectBuilder {
        &self.inner.builder
    }

    /// The manifest reader used by [`Container::load_services_from_json_file`].
    pub fn manifests(&self) -> &ManifestReader {
        &self.inner.manifests
    }

    /// Drop every cached service and memoized build.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        self.inner.builder.clear();
    }

    /// Check if both handles point to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// This container as a service instance.
    pub fn as_instance(&self) -> Instance {
        Instance::named(CONTAINER_TYPE, self.clone())
    }

    fn resolve_definition(
        &self,
        id: &str,
        definition: Option<ServiceDefinition>,
    ) -> Result<Instance, ConduitError> {
        match definition {
            Some(ServiceDefinition::Alias(target)) => self.resolve_alias(id, &target),
            Some(ServiceDefinition::Instance(instance)) => Ok(instance),
            Some(ServiceDefinition::SelfReference) => Ok(self.as_instance()),
            Some(definition) => Ok(self.inner.builder.build_from_definition(self, &definition)?),
            None => Ok(self.inner.builder.build(self, id, &[])?),
        }
    }

    fn resolve_alias(&self, id: &str, target: &str) -> Result<Instance, ConduitError> {
        {
            let definitions = self.inner.definitions.read();
            let mut chain = vec![id];
            let mut next = target;
            loop {
                if chain.contains(&next) {
                    chain.push(next);
                    return Err(ContainerError::InvalidServiceDefinition {
                        id: id.to_owned(),
                        reason: format!("alias cycle {}", chain.join(" -> ")),
                    }
                    .into());
                }
                chain.push(next);
                match definitions.get(next) {
                    Some(ServiceDefinition::Alias(further)) => next = further.as_str(),
                    _ => break,
                }
            }
        }
        trace!(id, target, "following alias");
        Ok(self.get(target)?)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.definitions())
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures and creates a [`Container`].
///
/// # Example
/// ```ignore
/// let container = ContainerBuilder::new(types)
///     .ttl(Ttl::Seconds(300))
///     .service("mailer", ServiceDefinition::class("SmtpMailer"))
///     .build();
/// ```
pub struct ContainerBuilder {
    types: TypeRegistry,
    cache: Option<Arc<dyn Cache<Instance>>>,
    ttl: Option<Ttl>,
    environment: Option<Arc<dyn Environment>>,
    manifests: Option<ManifestReader>,
    services: Vec<(String, ServiceDefinition)>,
}

impl ContainerBuilder {
    /// Start from the registered `types`.
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            cache: None,
            ttl: None,
            environment: None,
            manifests: None,
            services: Vec::new(),
        }
    }

    /// Apply the TTL and module filter from `config`.
    pub fn config(mut self, config: &ConduitConfig) -> Self {
        self.ttl = config.cache_ttl();
        self.manifests = Some(config.manifest_reader());
        self
    }

    /// Store instances in `cache` instead of a private [`MemoryCache`].
    pub fn cache(mut self, cache: Arc<dyn Cache<Instance>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Expire cached services after `ttl`.
    pub fn ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Answer `ENV.` arguments from `environment`.
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Read service manifests with `manifests`.
    pub fn manifests(mut self, manifests: ManifestReader) -> Self {
        self.manifests = Some(manifests);
        self
    }

    /// Register a service up front.
    pub fn service(mut self, id: impl Into<String>, definition: ServiceDefinition) -> Self {
        self.services.push((id.into(), definition));
        self
    }

    /// Create the container.
    ///
    /// Up-front services that collide with a reserved id are skipped.
    pub fn build(self) -> Container {
        let mut builder = ObjectBuilder::new(self.types);
        if let Some(environment) = self.environment {
            builder = builder.with_environment(environment);
        }

        let definitions = HashMap::from([
            (CONTAINER_ID.to_owned(), ServiceDefinition::SelfReference),
            (CONTAINER_TYPE.to_owned(), ServiceDefinition::SelfReference),
        ]);

        let container = Container {
            inner: Arc::new(Inner {
                definitions: RwLock::new(definitions),
                cache: self
                    .cache
                    .unwrap_or_else(|| Arc::new(MemoryCache::<Instance>::new())),
                ttl: self.ttl,
                builder,
                manifests: self.manifests.unwrap_or_default(),
            }),
        };

        for (id, definition) in self.services {
            if let Err(error) = container.set(id, definition) {
                debug!(%error, "skipping up-front service");
            }
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::{Arguments, BoxError, BuildError, Constructible, Parameter};

    #[derive(Debug)]
    struct Mailer {
        transport: String,
    }

    impl Constructible for Mailer {
        const NAME: &'static str = "Mailer";

        fn parameters() -> Vec<Parameter> {
            vec![Parameter::new("transport").with_default("smtp")]
        }

        fn construct(args: &Arguments) -> Result<Self, BoxError> {
            Ok(Mailer {
                transport: args.value("transport")?,
            })
        }
    }

    fn container() -> Container {
        let mut types = TypeRegistry::new();
        types.register::<Mailer>();
        Container::new(types)
    }

    #[test]
    fn test_set_then_has_and_cached_get() {
        let container = container();
        container.set("mailer", ServiceDefinition::class("Mailer")).unwrap();
        assert!(container.has("mailer"));

        let a = container.get("mailer").unwrap();
        let b = container.get("mailer").unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(container.resolve::<Mailer>("mailer").unwrap().transport, "smtp");
    }

    #[test]
    fn test_first_definition_wins() {
        let container = container();
        container
            .set_json("mailer", &serde_json::json!({"class": "Mailer", "arguments": ["sendmail"]}))
            .unwrap();
        container.set("mailer", ServiceDefinition::class("Mailer")).unwrap();

        assert_eq!(container.resolve::<Mailer>("mailer").unwrap().transport, "sendmail");
    }

    #[test]
    fn test_reserved_ids() {
        let container = container();
        for id in [CONTAINER_ID, CONTAINER_TYPE] {
            assert!(container.has(id));
            assert!(matches!(
                container.set(id, ServiceDefinition::class("Mailer")),
                Err(ContainerError::InvalidServiceDefinition { .. })
            ));
            let resolved = container.resolve::<Container>(id).unwrap();
            assert!(resolved.ptr_eq(&container));
        }
    }

    #[test]
    fn test_undefined_id_is_built_as_class() {
        let container = container();
        assert!(!container.has("Mailer"));
        assert!(container.get("Mailer").unwrap().is::<Mailer>());
        // Cached now.
        assert!(container.has("Mailer"));
    }

    #[test]
    fn test_failures_are_wrapped() {
        let container = container();
        let err = container.get("Nothing").unwrap_err();
        match err {
            ContainerError::ServiceNotFound { id, source } => {
                assert_eq!(id, "Nothing");
                assert!(matches!(*source, ConduitError::Build(BuildError::UnknownType(_))));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_aliases_and_cycles() {
        let container = container();
        container.set("mailer", ServiceDefinition::class("Mailer")).unwrap();
        container.set("mail", ServiceDefinition::alias("mailer")).unwrap();
        assert!(container.get("mail").unwrap().ptr_eq(&container.get("mailer").unwrap()));

        container.set("a", ServiceDefinition::alias("b")).unwrap();
        container.set("b", ServiceDefinition::alias("a")).unwrap();
        let err = container.get("a").unwrap_err();
        assert!(matches!(
            err,
            ContainerError::ServiceNotFound { ref source, .. }
                if matches!(**source, ConduitError::Container(ContainerError::InvalidServiceDefinition { .. }))
        ));
    }

    #[test]
    fn test_set_json_rejects_invalid_shapes() {
        let container = container();
        assert!(matches!(
            container.set_json("bad", &serde_json::json!(42)),
            Err(ContainerError::InvalidServiceDefinition { .. })
        ));
        assert!(!container.has("bad"));
    }

    #[test]
    fn test_type_mismatch_and_clear_cache() {
        let container = container();
        container.set("mailer", ServiceDefinition::class("Mailer")).unwrap();
        assert!(matches!(
            container.resolve::<String>("mailer"),
            Err(ContainerError::TypeMismatch { .. })
        ));

        let before = container.get("mailer").unwrap();
        container.clear_cache();
        assert!(!before.ptr_eq(&container.get("mailer").unwrap()));
    }
}
