//! Tracing subscriber bootstrap.
//!
//! The library itself only emits `tracing` events (targets
//! `imagekit_transform::compiler`, `imagekit_transform::delivery` and
//! `imagekit_transform::http`). Binaries and tests that want to see them can
//! install a subscriber here.
//!
//! ```rust,ignore
//! use imagekit_transform::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! init_subscriber(config)?;
//! ```

use crate::error::TelemetryError;

pub const LOG_LEVEL_ENV: &str = "IKT_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "IKT_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    Json,
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(TelemetryError::Init(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Debug-level text output.
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            output_format: OutputFormat::Text,
        }
    }

    /// Build a config from a variable lookup (normally the process environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TelemetryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            builder = builder.output_format(format.parse()?);
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, TelemetryError> {
        let level = match level.to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            _ => {
                return Err(TelemetryError::Init(format!(
                    "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
        }
    }
}

/// Install a global fmt subscriber filtered to this crate.
///
/// An already-installed global subscriber is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<(), TelemetryError> {
    let level = config.log_level.as_str().to_lowercase();
    let filter = format!("imagekit_transform={level}");

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .compact()
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(()),
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("global default trace dispatcher has already been set") {
                Ok(())
            } else {
                Err(TelemetryError::Init(format!("Failed to initialize tracing: {e}")))
            }
        }
    }
}

pub fn init_default() -> Result<(), TelemetryError> {
    init_subscriber(SubscriberConfig::default())
}

/// Initialise from `IKT_LOG_LEVEL` (trace, debug, info, warn, error) and
/// `IKT_LOG_FORMAT` (text, json, json-compact).
pub fn init_from_env() -> Result<(), TelemetryError> {
    init_subscriber(SubscriberConfig::from_lookup(|key| std::env::var(key).ok())?)
}
