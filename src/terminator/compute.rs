//! Instance deletion through the Compute Engine REST API
use super::{InstanceIdentity, InstanceTerminator, TerminateError, Termination};
use crate::http::client::{canonical_reason, HttpClient, HttpClientError};
use crate::metadata::hostname::HostnameGetter;
use crate::metadata::MetadataReader;
use http::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

/// Long running operation returned by the delete call. Only used for logging.
#[derive(Debug, Default, Deserialize)]
struct Operation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Deletes the instance with `DELETE projects/{project}/zones/{zone}/instances/{name}`,
/// authenticated with the default service account token from the metadata server.
pub struct ComputeApiTerminator<M, C, H>
where
    M: MetadataReader,
    C: HttpClient,
    H: HostnameGetter,
{
    metadata: M,
    http_client: C,
    hostname_getter: H,
    endpoint: Url,
}

impl<M, C, H> ComputeApiTerminator<M, C, H>
where
    M: MetadataReader,
    C: HttpClient,
    H: HostnameGetter,
{
    pub fn new(metadata: M, http_client: C, hostname_getter: H, endpoint: Url) -> Self {
        Self {
            metadata,
            http_client,
            hostname_getter,
            endpoint,
        }
    }

    fn url(&self, project: &str, identity: &InstanceIdentity) -> Result<Url, TerminateError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| TerminateError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend([
                "projects",
                project,
                "zones",
                identity.zone.as_str(),
                "instances",
                identity.name.as_str(),
            ]);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap, TerminateError> {
        let token = self.metadata.access_token()?;
        let mut authorization = HeaderValue::from_str(&token.authorization()).map_err(|_| {
            HttpClientError::BuildingError("invalid authorization header value".to_string())
        })?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, authorization);
        Ok(headers)
    }
}

impl<M, C, H> InstanceTerminator for ComputeApiTerminator<M, C, H>
where
    M: MetadataReader,
    C: HttpClient,
    H: HostnameGetter,
{
    fn terminate(&self) -> Result<Termination, TerminateError> {
        let identity = InstanceIdentity::resolve(&self.metadata, &self.hostname_getter)?;
        let project = self.metadata.project_id()?;
        let url = self.url(&project, &identity)?;
        let headers = self.headers()?;

        info!(instance = %identity, %project, "Requesting instance deletion");
        let response = self.http_client.delete(url.as_str(), headers)?;
        let status = response.status();

        if status.is_success() {
            let operation: Operation = serde_json::from_slice(response.body()).unwrap_or_default();
            debug!(
                operation = %operation.name.unwrap_or_default(),
                status = %operation.status.unwrap_or_default(),
                "delete operation started"
            );
            return Ok(Termination::Requested);
        }

        if status == StatusCode::NOT_FOUND {
            info!(instance = %identity, "Instance not found, it was already deleted");
            return Ok(Termination::AlreadyGone);
        }

        let message = serde_json::from_slice::<ErrorResponse>(response.body())
            .map(|r| r.error.message)
            .unwrap_or_else(|_| canonical_reason(&response));
        Err(TerminateError::Rejected(status.as_u16(), message))
    }
}
