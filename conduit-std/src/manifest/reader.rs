use super::glob;
use crate::{
    bus::{BusKind, EventBus, MessageBus},
    container::Container,
};
use conduit_core::{Cache, ManifestError, ServiceDefinition, Ttl};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::{
    collections::HashSet,
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, trace};

// ============================================================================
// Module filters
// ============================================================================

/// Decides which glob-matched manifests belong to an active module.
pub trait ModuleFilter: Send + Sync {
    /// Whether the manifest at `path` should be loaded.
    ///
    /// `path` is relative to the directory of the manifest declaring the
    /// glob, so directories above it never take part.
    fn is_active(&self, path: &Path) -> bool;
}

/// Every module is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllModules;

impl ModuleFilter for AllModules {
    fn is_active(&self, _path: &Path) -> bool {
        true
    }
}

/// Only manifests below a directory named after an active module are loaded.
#[derive(Debug, Clone, Default)]
pub struct ActiveModules {
    names: HashSet<String>,
}

impl ActiveModules {
    /// Activate the given module names.
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ModuleFilter for ActiveModules {
    fn is_active(&self, path: &Path) -> bool {
        path.components()
            .any(|c| self.names.contains(c.as_os_str().to_string_lossy().as_ref()))
    }
}

// ============================================================================
// Entries
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum Entry<T> {
    Glob { glob: String },
    Item(T),
}

#[derive(Debug, Deserialize)]
struct HandlerEntry {
    id: String,
    handler: String,
    #[serde(default)]
    cli_alias: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListenerEntry {
    event: String,
    handler: String,
    #[serde(default)]
    priority: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    name: String,
    #[serde(flatten)]
    definition: Map<String, Value>,
}

const HANDLERS: &str = "handlers";
const LISTENERS: &str = "listeners";
const SERVICES: &str = "services";

// ============================================================================
// Reader
// ============================================================================

/// Reads handler, listener and service manifests.
///
/// Any entry may be `{"glob": "<pattern>"}`. The pattern is relative to the
/// directory of the manifest declaring it; every matching manifest of an
/// active module is read recursively, in sorted order. A file is read at
/// most once per load call, so glob cycles terminate.
#[derive(Clone)]
pub struct ManifestReader {
    modules: Arc<dyn ModuleFilter>,
    cache: Option<Arc<dyn Cache<Value>>>,
    ttl: Option<Ttl>,
}

impl ManifestReader {
    /// A reader loading every module, without a cache.
    pub fn new() -> Self {
        Self {
            modules: Arc::new(AllModules),
            cache: None,
            ttl: None,
        }
    }

    /// Filter glob matches with `modules`.
    pub fn with_modules(mut self, modules: Arc<dyn ModuleFilter>) -> Self {
        self.modules = modules;
        self
    }

    /// Keep parsed manifests in `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn Cache<Value>>, ttl: Option<Ttl>) -> Self {
        self.cache = Some(cache);
        self.ttl = ttl;
        self
    }

    /// Read and parse one manifest file.
    pub fn read(&self, path: &Path) -> Result<Value, ManifestError> {
        let key = manifest_key(path);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                trace!(path = %path.display(), "manifest cache hit");
                return Ok(hit);
            }
        }

        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(cache) = &self.cache {
            cache.set(&key, document.clone(), self.ttl);
        }
        Ok(document)
    }

    /// Register every handler of a handler manifest on `bus`.
    pub fn load_handlers<K: BusKind>(
        &self,
        bus: &MessageBus<K>,
        path: &Path,
    ) -> Result<usize, ManifestError> {
        let entries: Vec<HandlerEntry> = self.entries(path, HANDLERS)?;
        for entry in &entries {
            bus.register(&entry.id, &entry.handler, entry.cli_alias.as_deref());
        }
        debug!(path = %path.display(), bus = K::NAME, count = entries.len(), "handler manifest loaded");
        Ok(entries.len())
    }

    /// Register every listener of a listener manifest on `bus`.
    pub fn load_listeners(&self, bus: &EventBus, path: &Path) -> Result<usize, ManifestError> {
        let entries: Vec<ListenerEntry> = self.entries(path, LISTENERS)?;
        for entry in &entries {
            bus.register_with_priority(&entry.event, &entry.handler, entry.priority);
        }
        debug!(path = %path.display(), count = entries.len(), "listener manifest loaded");
        Ok(entries.len())
    }

    /// Define every service of a service manifest in `container`.
    pub fn load_services(&self, container: &Container, path: &Path) -> Result<usize, ManifestError> {
        let entries: Vec<ServiceEntry> = self.entries(path, SERVICES)?;
        for entry in &entries {
            let definition =
                ServiceDefinition::from_json(&entry.name, &Value::Object(entry.definition.clone()))?;
            container.set(entry.name.clone(), definition)?;
        }
        debug!(path = %path.display(), count = entries.len(), "service manifest loaded");
        Ok(entries.len())
    }

    /// Collect the entries of `section`, expanding globs.
    pub fn entries<T: DeserializeOwned>(
        &self,
        path: &Path,
        section: &str,
    ) -> Result<Vec<T>, ManifestError> {
        let mut visited = HashSet::new();
        let mut entries = Vec::new();
        self.collect(path, section, &mut visited, &mut entries)?;
        Ok(entries)
    }

    fn collect<T: DeserializeOwned>(
        &self,
        path: &Path,
        section: &str,
        visited: &mut HashSet<PathBuf>,
        out: &mut Vec<T>,
    ) -> Result<(), ManifestError> {
        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !visited.insert(identity) {
            trace!(path = %path.display(), "manifest already loaded");
            return Ok(());
        }

        let document = self.read(path)?;
        let items = match document.get(section) {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(ManifestError::Shape {
                    path: path.to_path_buf(),
                    reason: format!("`{section}` must be a list"),
                });
            }
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for item in items {
            let entry: Entry<T> = serde_json::from_value(item).map_err(|e| ManifestError::Shape {
                path: path.to_path_buf(),
                reason: format!("invalid `{section}` entry: {e}"),
            })?;
            match entry {
                Entry::Item(item) => out.push(item),
                Entry::Glob { glob: pattern } => {
                    for file in glob::expand(base, &pattern)? {
                        let relative = file.strip_prefix(base).unwrap_or(&file);
                        if self.modules.is_active(relative) {
                            self.collect(&file, section, visited, out)?;
                        } else {
                            trace!(path = %file.display(), "skipping inactive module");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for ManifestReader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManifestReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestReader")
            .field("cached", &self.cache.is_some())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn manifest_key(path: &Path) -> String {
    format!(
        "manifest.{}",
        hex::encode(Sha256::digest(path.to_string_lossy().as_bytes()))
    )
}
