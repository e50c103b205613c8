//! Agent configuration: an optional YAML file overlaid with `GCP_KEEPALIVE__*` environment
//! variables. Every field has a default.
use crate::http::config::HttpConfig;
use crate::logging::LoggingConfig;
use crate::metadata::MetadataConfig;
use crate::pipeline::PipelineConfig;
use crate::terminator::TerminatorConfig;
use config::{Config, Environment, File, FileFormat};
use duration_str::deserialize_duration;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/gcp-keepalive/config.yaml";
/// Environment variable holding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "GCP_KEEPALIVE_CONFIG";
const ENV_PREFIX: &str = "GCP_KEEPALIVE";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load the configuration from `{0}`: {1}")]
    Load(String, #[source] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub log: LoggingConfig,
    pub http: HttpConfig,
    pub metadata: MetadataConfig,
    pub pipeline: PipelineConfig,
    /// Pause between two pipeline polls while the pipeline is running.
    #[serde(deserialize_with = "deserialize_duration")]
    pub poll_interval: Duration,
    pub terminator: TerminatorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log: LoggingConfig::default(),
            http: HttpConfig::default(),
            metadata: MetadataConfig::default(),
            pipeline: PipelineConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            terminator: TerminatorConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Path of the configuration file, `GCP_KEEPALIVE_CONFIG` or the default one.
    pub fn config_path() -> PathBuf {
        env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads the configuration. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// `env_vars` replaces the process environment when provided.
    fn load_with_env(
        path: &Path,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let load_err = |err| ConfigError::Load(path.to_string_lossy().to_string(), err);

        Config::builder()
            .add_source(
                File::new(path.to_string_lossy().as_ref(), FileFormat::Yaml).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .source(env_vars),
            )
            .build()
            .map_err(load_err)?
            .try_deserialize::<AgentConfig>()
            .map_err(load_err)
    }
}
