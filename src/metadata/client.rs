//! Metadata server client implementation
use super::{AccessToken, MetadataError, MetadataReader};
use crate::http::client::{canonical_reason, HttpClient};
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use tracing::{debug, trace};
use url::Url;

const HEADER_KEY: &str = "metadata-flavor";
const HEADER_VALUE: &str = "Google";

const METADATA_ROOT_PATH: &str = "computeMetadata/v1";
const ATTRIBUTES_PATH: &str = "instance/attributes";
const ZONE_PATH: &str = "instance/zone";
const PROJECT_ID_PATH: &str = "project/project-id";
const TOKEN_PATH: &str = "instance/service-accounts/default/token";

/// The `GcpMetadataClient` struct encapsulates an HTTP client used to retrieve the instance metadata.
pub struct GcpMetadataClient<C: HttpClient> {
    http_client: C,
    endpoint: Url,
    headers: HeaderMap,
}

impl<C: HttpClient> GcpMetadataClient<C> {
    /// Returns a new instance of GcpMetadataClient
    pub fn new(http_client: C, endpoint: Url) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_KEY),
            HeaderValue::from_static(HEADER_VALUE),
        );

        Self {
            http_client,
            endpoint,
            headers,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{METADATA_ROOT_PATH}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reads the raw value under `path`, trimmed of surrounding whitespace.
    fn get(&self, path: &str) -> Result<String, MetadataError> {
        let url = self.url(path);
        trace!(%url, "requesting metadata");
        let response = self.http_client.get(&url, self.headers.clone())?;

        // return error if status code is not within 200-299.
        if !response.status().is_success() {
            return Err(MetadataError::UnsuccessfulResponse(
                response.status().as_u16(),
                canonical_reason(&response),
            ));
        }

        let value = String::from_utf8(response.into_body())
            .map_err(|err| MetadataError::InvalidBody(err.to_string()))?;
        Ok(value.trim().to_string())
    }

    fn get_not_empty(&self, path: &str) -> Result<String, MetadataError> {
        let value = self.get(path)?;
        if value.is_empty() {
            return Err(MetadataError::EmptyValue(path.to_string()));
        }
        Ok(value)
    }
}

impl<C: HttpClient> MetadataReader for GcpMetadataClient<C> {
    fn attribute(&self, name: &str, default_value: &str) -> String {
        let path = format!("{ATTRIBUTES_PATH}/{}", name.to_uppercase());
        self.get(&path).unwrap_or_else(|err| {
            debug!(attribute = name, %err, "metadata attribute not available, using default value");
            default_value.to_string()
        })
    }

    fn zone(&self) -> Result<String, MetadataError> {
        // The metadata server returns the full resource path: `projects/<number>/zones/<zone>`.
        let zone_path = self.get_not_empty(ZONE_PATH)?;
        let zone = zone_path.rsplit('/').next().unwrap_or_default();
        if zone.is_empty() {
            return Err(MetadataError::EmptyValue(ZONE_PATH.to_string()));
        }
        Ok(zone.to_string())
    }

    fn project_id(&self) -> Result<String, MetadataError> {
        self.get_not_empty(PROJECT_ID_PATH)
    }

    fn access_token(&self) -> Result<AccessToken, MetadataError> {
        let body = self.get(TOKEN_PATH)?;
        let token: AccessToken = serde_json::from_str(&body)?;
        if token.is_empty() {
            return Err(MetadataError::EmptyValue(TOKEN_PATH.to_string()));
        }
        Ok(token)
    }
}
