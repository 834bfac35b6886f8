//! Runtime configuration.

use crate::{
    env::{Environment, ProcessEnvironment},
    manifest::{ActiveModules, AllModules, ManifestReader, ModuleFilter},
};
use conduit_core::Ttl;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// Environment variable selecting the [`RuntimeContext`].
pub const CONTEXT_VAR: &str = "CONDUIT_CONTEXT";
/// Environment variable enabling background event dispatch.
pub const ASYNC_EVENTS_VAR: &str = "CONDUIT_ASYNC_EVENTS";
/// Environment variable holding the service cache TTL in seconds.
pub const CACHE_TTL_VAR: &str = "CONDUIT_CACHE_TTL";
/// Environment variable listing active modules, comma separated.
pub const ACTIVE_MODULES_VAR: &str = "CONDUIT_ACTIVE_MODULES";

/// How the process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeContext {
    /// A command line invocation.
    CommandLine,
    /// Serving a request.
    #[default]
    Request,
}

impl RuntimeContext {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "command_line" | "cli" => Some(Self::CommandLine),
            "request" | "web" => Some(Self::Request),
            _ => None,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config `{}`", .path.display())]
    Io {
        /// The config file.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse config `{}`", .path.display())]
    Parse {
        /// The config file.
        path: PathBuf,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Settings shared by the container and the buses.
///
/// ```json
/// {"context": "command_line", "async_events": true, "cache_ttl_secs": 300}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConduitConfig {
    /// How the process is running.
    pub context: RuntimeContext,
    /// Dispatch events on the background worker. Only honoured on the
    /// command line.
    pub async_events: bool,
    /// Lifetime of cached services. `None` or zero keeps them forever.
    pub cache_ttl_secs: Option<u64>,
    /// Modules whose manifests are loaded by globs. `None` loads all.
    pub active_modules: Option<Vec<String>>,
}

impl ConduitConfig {
    /// Read configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_environment(&ProcessEnvironment)
    }

    /// Read configuration from `env`. Unset or unparsable variables keep
    /// their defaults.
    pub fn from_environment(env: &dyn Environment) -> Self {
        let mut config = Self::default();
        if let Some(context) = env.var(CONTEXT_VAR).as_deref().and_then(RuntimeContext::parse) {
            config.context = context;
        }
        if let Some(flag) = env.var(ASYNC_EVENTS_VAR) {
            config.async_events = is_truthy(&flag);
        }
        config.cache_ttl_secs = env
            .var(CACHE_TTL_VAR)
            .and_then(|raw| raw.trim().parse().ok());
        config.active_modules = env.var(ACTIVE_MODULES_VAR).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect()
        });
        config
    }

    /// Whether events go to the background worker.
    pub fn async_mode(&self) -> bool {
        self.context == RuntimeContext::CommandLine && self.async_events
    }

    /// TTL applied to cached services.
    pub fn cache_ttl(&self) -> Option<Ttl> {
        self.cache_ttl_secs.map(Ttl::Seconds)
    }

    /// The module filter for glob expansion.
    pub fn module_filter(&self) -> Arc<dyn ModuleFilter> {
        match &self.active_modules {
            Some(names) => Arc::new(ActiveModules::new(names.iter().cloned())),
            None => Arc::new(AllModules),
        }
    }

    /// A manifest reader honouring [`ConduitConfig::module_filter`].
    pub fn manifest_reader(&self) -> ManifestReader {
        ManifestReader::new().with_modules(self.module_filter())
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ConduitConfig::default();
        assert_eq!(config.context, RuntimeContext::Request);
        assert!(!config.async_mode());
        assert_eq!(config.cache_ttl(), None);
    }

    #[test]
    fn test_from_environment() {
        let config = ConduitConfig::from_environment(&env(&[
            (CONTEXT_VAR, "cli"),
            (ASYNC_EVENTS_VAR, "TRUE"),
            (CACHE_TTL_VAR, "60"),
            (ACTIVE_MODULES_VAR, "billing, shipping,"),
        ]));
        assert!(config.async_mode());
        assert_eq!(config.cache_ttl(), Some(Ttl::Seconds(60)));
        assert_eq!(
            config.active_modules,
            Some(vec!["billing".to_owned(), "shipping".to_owned()])
        );
    }

    #[test]
    fn test_async_requires_command_line() {
        let config = ConduitConfig::from_environment(&env(&[(ASYNC_EVENTS_VAR, "1")]));
        assert!(config.async_events);
        assert!(!config.async_mode());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conduit.json");
        fs::write(&path, r#"{"context": "command_line", "async_events": true}"#).unwrap();

        let config = ConduitConfig::from_json_file(&path).unwrap();
        assert!(config.async_mode());
        assert_eq!(config.active_modules, None);

        fs::write(&path, "{").unwrap();
        assert!(matches!(
            ConduitConfig::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ConduitConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
