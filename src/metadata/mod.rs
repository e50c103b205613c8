//! Access to the Compute Engine metadata service.
//!
//! The metadata service is the only configuration source of the keepalive settings: the operator
//! sets them as instance attributes when creating the instance. It also exposes the facts needed
//! to delete the instance (zone, project and a service account token).
pub mod client;
pub mod hostname;

use crate::http::client::HttpClientError;
use serde::Deserialize;
use std::env::{self, VarError};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default Compute Engine metadata server.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";
/// Environment variable overriding the metadata server host, as honoured by the Google Cloud SDKs.
pub const GCE_METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

/// Read-only view over the instance metadata.
pub trait MetadataReader {
    /// Returns the value of the instance attribute `name` (upper-cased before lookup), or
    /// `default_value` if the attribute cannot be read for any reason.
    fn attribute(&self, name: &str, default_value: &str) -> String;

    /// Returns the short zone name of the instance, e.g. `us-central1-c`.
    fn zone(&self) -> Result<String, MetadataError>;

    /// Returns the id of the project owning the instance.
    fn project_id(&self) -> Result<String, MetadataError>;

    /// Returns an access token for the default service account of the instance.
    fn access_token(&self) -> Result<AccessToken, MetadataError>;
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Http(#[from] HttpClientError),
    #[error("metadata server answered with status code: `{0}` Canonical reason: `{1}`")]
    UnsuccessfulResponse(u16, String),
    #[error("metadata value is not valid UTF-8: {0}")]
    InvalidBody(String),
    #[error("could not parse metadata value: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata value `{0}` is empty")]
    EmptyValue(String),
}

/// OAuth2 access token issued by the metadata server.
#[derive(Clone, PartialEq, Deserialize)]
pub struct AccessToken {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl AccessToken {
    pub fn new(access_token: String, token_type: String) -> Self {
        Self {
            access_token,
            token_type,
        }
    }

    /// Value to be used in the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Metadata service configuration.
///
/// The endpoint priority is:
///
/// `metadata.endpoint` configuration option
/// GCE_METADATA_HOST environment variable
/// [DEFAULT_METADATA_ENDPOINT]
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    endpoint: Option<Url>,
}

impl MetadataConfig {
    pub fn with_endpoint(endpoint: Url) -> Self {
        Self {
            endpoint: Some(endpoint),
        }
    }

    /// Returns the metadata server endpoint, including the value from the environment if it applies.
    pub fn endpoint(&self) -> Url {
        self.env_aware_endpoint(env::var)
    }

    fn env_aware_endpoint<F>(&self, env_var: F) -> Url
    where
        F: Fn(&'static str) -> Result<String, VarError>,
    {
        if let Some(endpoint) = self.endpoint.as_ref() {
            return endpoint.clone();
        }
        if let Ok(host) = env_var(GCE_METADATA_HOST_ENV) {
            match Url::parse(&format!("http://{}", host.trim())) {
                Ok(url) => return url,
                Err(err) => {
                    warn!(%err, %host, "ignoring invalid {GCE_METADATA_HOST_ENV}");
                }
            }
        }
        default_metadata_endpoint()
    }
}

fn default_metadata_endpoint() -> Url {
    Url::parse(DEFAULT_METADATA_ENDPOINT).expect("constant valid value")
}
