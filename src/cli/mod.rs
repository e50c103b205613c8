//! Command line interface.
//!
//! The agent takes all its settings from the instance metadata and the configuration file, so
//! the only flags are informational.
use crate::config::{AgentConfig, ConfigError};
use crate::logging::LoggingError;
use crate::utils::binary_metadata::binary_metadata;
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info};

/// All possible errors that can happen while running the initialization.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("could not initialize logging: {0}")]
    Logging(#[from] LoggingError),
}

/// Command line arguments, as parsed by [`clap`].
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)] // Read from `Cargo.toml`
pub struct Command {
    /// Prints the version and exits.
    #[arg(long)]
    version: bool,

    /// Prints the parsed flags and the configuration path and exits.
    #[arg(long)]
    print_debug_info: bool,
}

impl Command {
    /// Runs the provided main function or shows the binary information according to flags
    pub fn run<F: Fn(AgentConfig) -> Result<(), Box<dyn Error>>>(main_fn: F) -> ExitCode {
        let flags = Self::parse();

        if flags.version {
            println!("{}", binary_metadata());
            return ExitCode::SUCCESS;
        }
        if flags.print_debug_info {
            println!("FLAGS: {flags:#?}");
            println!("Configuration file: {}", AgentConfig::config_path().display());
            return ExitCode::SUCCESS;
        }

        let Ok(config) = Self::init().inspect_err(|err| {
            // Logging might not be initialized
            println!("Error on gcp-keepalive initialization: {err}");
        }) else {
            return ExitCode::FAILURE;
        };

        match main_fn(config) {
            Ok(_) => {
                info!("gcp-keepalive exited successfully");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("gcp-keepalive exited with an error: {err}");
                ExitCode::FAILURE
            }
        }
    }

    fn init() -> Result<AgentConfig, InitError> {
        let path = AgentConfig::config_path();
        let config = AgentConfig::load(&path)?;
        config.log.try_init()?;
        info!("{}", binary_metadata());
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
