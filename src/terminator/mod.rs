//! Deletion of the instance the agent runs on.
//!
//! Deleting is a one-way operation on the cloud control plane. Both implementations treat an
//! instance that no longer exists as a successful outcome, so issuing the delete more than once
//! is harmless.
pub mod compute;
pub mod gcloud;

use crate::http::client::HttpClientError;
use crate::metadata::hostname::{instance_name, HostnameError, HostnameGetter};
use crate::metadata::{MetadataError, MetadataReader};
use duration_str::deserialize_duration;
use serde::Deserialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";
const DEFAULT_GCLOUD_PATH: &str = "gcloud";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

pub trait InstanceTerminator {
    /// Issues the delete of the current instance. It does not wait for the deletion to complete.
    fn terminate(&self) -> Result<Termination, TerminateError>;
}

impl<T: InstanceTerminator + ?Sized> InstanceTerminator for Box<T> {
    fn terminate(&self) -> Result<Termination, TerminateError> {
        (**self).terminate()
    }
}

/// Outcome of a successful terminate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The control plane accepted the delete request.
    Requested,
    /// The instance was already deleted.
    AlreadyGone,
}

#[derive(Error, Debug)]
pub enum TerminateError {
    #[error("could not resolve the instance identity: {0}")]
    Metadata(#[from] MetadataError),
    #[error("could not resolve the instance name: {0}")]
    Hostname(#[from] HostnameError),
    #[error("delete request failed: {0}")]
    Http(#[from] HttpClientError),
    #[error("delete request rejected with status code: `{0}`: {1}")]
    Rejected(u16, String),
    #[error("invalid compute endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("delete command failed: {0}")]
    Command(String),
    #[error("delete command did not finish within {0:?}")]
    Timeout(Duration),
}

/// Name and zone identifying the instance in the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub name: String,
    pub zone: String,
}

impl InstanceIdentity {
    /// Resolves the instance name from the OS hostname and the zone from the metadata service.
    /// Both are required, any failure is returned.
    pub fn resolve<M, H>(metadata: &M, hostname_getter: &H) -> Result<Self, TerminateError>
    where
        M: MetadataReader,
        H: HostnameGetter,
    {
        let hostname = hostname_getter.hostname()?;
        let name = instance_name(&hostname).to_string();
        if name.is_empty() {
            return Err(TerminateError::Hostname(HostnameError::empty()));
        }
        let zone = metadata.zone()?;
        Ok(Self { name, zone })
    }
}

impl Display for InstanceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.zone)
    }
}

/// How the delete is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminationMethod {
    /// Compute Engine REST API authenticated with the instance service account.
    #[default]
    Api,
    /// `gcloud compute instances delete`.
    Gcloud,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerminatorConfig {
    pub method: TerminationMethod,
    pub compute_endpoint: Url,
    pub gcloud_path: PathBuf,
    /// Time `gcloud` is given to exit before it is killed.
    #[serde(deserialize_with = "deserialize_duration")]
    pub command_timeout: Duration,
}

impl Default for TerminatorConfig {
    fn default() -> Self {
        Self {
            method: TerminationMethod::default(),
            compute_endpoint: Url::parse(DEFAULT_COMPUTE_ENDPOINT).expect("constant valid value"),
            gcloud_path: PathBuf::from(DEFAULT_GCLOUD_PATH),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}
