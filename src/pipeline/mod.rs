//! CircleCI pipeline status.
pub mod circleci;
pub mod decision;

use crate::http::client::HttpClientError;
use duration_str::deserialize_duration;
use serde::Deserialize;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_PIPELINE_ENDPOINT: &str = "https://circleci.com/api/v2";
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 1;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

const RUNNING_STATUS: &str = "running";

/// Source of the workflows belonging to a pipeline.
pub trait PipelineStatusClient {
    fn list_workflows(
        &self,
        pipeline_id: &str,
        api_token: &ApiToken,
    ) -> Result<Vec<Workflow>, PipelineError>;
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline status request failed: {0}")]
    Http(#[from] HttpClientError),
    #[error("pipeline status endpoint answered with status code: `{0}` Canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
    #[error("could not parse the pipeline workflows: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pipeline endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("the API token cannot be used as a header value")]
    InvalidToken,
}

/// A CircleCI workflow as reported by the pipeline workflow listing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
}

impl Workflow {
    pub fn with_status(status: WorkflowStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == WorkflowStatus::Running
    }
}

/// Workflow status. Only `running` is meaningful to the agent, any other value (including
/// values CircleCI may add in the future) is kept verbatim and logged after each poll.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum WorkflowStatus {
    Running,
    Other(String),
    /// The status field is missing or null.
    #[default]
    Unknown,
}

impl From<Option<String>> for WorkflowStatus {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(status) if status == RUNNING_STATUS => Self::Running,
            Some(status) => Self::Other(status),
            None => Self::Unknown,
        }
    }
}

impl Display for WorkflowStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => f.write_str(RUNNING_STATUS),
            Self::Other(status) => f.write_str(status),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<&str> for WorkflowStatus {
    fn from(value: &str) -> Self {
        Self::from(Some(value.to_string()))
    }
}

/// CircleCI personal API token. It is never printed.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ApiToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Debug for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiToken(***)")
    }
}

/// Pipeline status client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub endpoint: Url,
    /// Polling attempts per iteration before a failure is considered fatal.
    pub max_poll_attempts: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub retry_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_PIPELINE_ENDPOINT).expect("constant valid value"),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}
