//! Tracing subscriber initialisation.
//!
//! Conduit logs through `tracing`: registrations and dispatches at `debug`,
//! cache hits at `trace`, background listener failures at `warn`. Nothing is
//! printed until a subscriber is installed, either by the application or by
//! [`init`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::{EnvFilter, fmt};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Environment variable overriding [`TelemetryConfig::filter`].
pub const FILTER_VAR: &str = "CONDUIT_LOG";

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One line per event with all fields.
    #[default]
    Full,
    /// Shorter lines for interactive use.
    Compact,
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// An `EnvFilter` directive, e.g. `"conduit_std=debug"`.
    pub filter: String,
    /// Output layout.
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::Full,
        }
    }
}

impl TelemetryConfig {
    /// Default settings with the filter taken from `CONDUIT_LOG` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(filter) = std::env::var(FILTER_VAR) {
            config.filter = filter;
        }
        config
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on the first call.
///
/// Later calls return `Ok(())` without touching the global state.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| ())
}

fn install_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format {
        LogFormat::Full => Box::new(builder.finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
