//! Console logging setup.
pub mod format;

use format::LoggingFormat;
use serde::Deserialize;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::PrettyFields;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable overriding the configured level with any `EnvFilter` directive.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
const CRATE_TARGET: &str = "gcp_keepalive";

/// An enum representing possible errors during the logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("init logging error: `{0}`")]
    TryInitError(String),
    #[error("invalid logging directive `{0}`")]
    InvalidDirective(String),
}

/// Defines the logging configuration for the agent.
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub(crate) format: LoggingFormat,
    #[serde(default)]
    pub(crate) level: LogLevel,
}

impl LoggingConfig {
    /// Attempts to initialize the global logging subscriber, writing to stdout.
    pub fn try_init(&self) -> Result<(), LoggingError> {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(self.format.target)
            .with_timer(ChronoLocal::new(self.format.timestamp.0.clone()))
            .fmt_fields(PrettyFields::new())
            .with_filter(self.logging_filter()?);

        tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .map_err(|_| {
                LoggingError::TryInitError("unable to set the global logging subscriber".to_string())
            })?;

        debug!("Logging initialized successfully");
        Ok(())
    }

    /// Only events from this crate are logged at the configured level. `LOG_LEVEL` replaces the
    /// default directive when set.
    fn logging_filter(&self) -> Result<EnvFilter, LoggingError> {
        let directive = self.crate_directive()?;
        Ok(EnvFilter::builder()
            .with_default_directive(directive)
            .with_env_var(LOG_LEVEL_ENV)
            .from_env_lossy())
    }

    fn crate_directive(&self) -> Result<Directive, LoggingError> {
        let directive = format!(
            "{CRATE_TARGET}={}",
            self.level.as_level().to_string().to_lowercase()
        );
        directive
            .parse::<Directive>()
            .map_err(|_| LoggingError::InvalidDirective(directive))
    }
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct LogLevel(Level);

impl LogLevel {
    fn as_level(&self) -> Level {
        self.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self(Level::INFO)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Level::from_str(&value_str)
            .map(LogLevel)
            .map_err(serde::de::Error::custom)
    }
}
