//! Builds the agent from the loaded configuration and runs it.
use super::clock::SystemClock;
use super::config::{default_self_destruct_interval, KeepaliveConfig};
use super::error::AgentError;
use super::{KeepaliveAgent, PollSettings, RunReport};
use crate::config::AgentConfig;
use crate::http::client::HttpClientError;
use crate::http::reqwest::ReqwestHttpClient;
use crate::metadata::client::GcpMetadataClient;
use crate::metadata::hostname::SystemHostnameGetter;
use crate::pipeline::circleci::CircleCiClient;
use crate::terminator::compute::ComputeApiTerminator;
use crate::terminator::gcloud::GcloudTerminator;
use crate::terminator::{InstanceTerminator, TerminationMethod};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("could not build the http client: {0}")]
    HttpClient(#[from] HttpClientError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<&AgentConfig> for PollSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.pipeline.max_poll_attempts,
            retry_interval: config.pipeline.retry_interval,
        }
    }
}

/// Resolves the keepalive settings from the metadata server and runs the polling loop until the
/// instance termination is issued.
pub fn run(config: &AgentConfig) -> Result<RunReport, RunError> {
    let http_client = ReqwestHttpClient::try_new(&config.http)?;
    let metadata_endpoint = config.metadata.endpoint();
    debug!(endpoint = %metadata_endpoint, "using metadata server");

    let metadata = GcpMetadataClient::new(http_client.clone(), metadata_endpoint.clone());
    let keepalive_config = KeepaliveConfig::resolve(&metadata, default_self_destruct_interval());

    let agent = KeepaliveAgent::new(
        CircleCiClient::new(http_client.clone(), config.pipeline.endpoint.clone()),
        build_terminator(config, http_client, metadata_endpoint),
        SystemClock,
        PollSettings::from(config),
    );

    Ok(agent.run(&keepalive_config)?)
}

fn build_terminator(
    config: &AgentConfig,
    http_client: ReqwestHttpClient,
    metadata_endpoint: Url,
) -> Box<dyn InstanceTerminator> {
    let metadata = GcpMetadataClient::new(http_client.clone(), metadata_endpoint);
    match config.terminator.method {
        TerminationMethod::Api => Box::new(ComputeApiTerminator::new(
            metadata,
            http_client,
            SystemHostnameGetter,
            config.terminator.compute_endpoint.clone(),
        )),
        TerminationMethod::Gcloud => Box::new(GcloudTerminator::new(
            metadata,
            SystemHostnameGetter,
            config.terminator.gcloud_path.clone(),
            config.terminator.command_timeout,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;
    use std::time::Duration;

    #[test]
    fn poll_settings_from_config() {
        let config = AgentConfig {
            poll_interval: Duration::from_secs(10),
            pipeline: PipelineConfig {
                max_poll_attempts: 4,
                retry_interval: Duration::from_secs(1),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(
            PollSettings::from(&config),
            PollSettings {
                interval: Duration::from_secs(10),
                max_attempts: 4,
                retry_interval: Duration::from_secs(1),
            }
        );
    }
}
