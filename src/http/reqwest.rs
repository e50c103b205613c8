//! # Helpers to build a reqwest blocking client and handle responses
use super::client::{HttpClient, HttpClientError};
use super::config::HttpConfig;
use http::{Request, Response};
use reqwest::blocking::{Client, ClientBuilder};

/// Helper to build a [http::Response<Vec<u8>>] from a reqwest's blocking response.
/// It includes status, version and body. Headers are not included but they could be added if needed.
pub fn try_build_response(
    res: reqwest::blocking::Response,
) -> Result<Response<Vec<u8>>, HttpClientError> {
    let status = res.status();
    let version = res.version();
    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpClientError::ResponseError(err.to_string()))?
        .into();
    Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpClientError::ResponseError(err.to_string()))
}

/// Returns a reqwest [ClientBuilder] with the default setup for the agent and the provided timeout values.
pub fn reqwest_builder_with_timeout(config: &HttpConfig) -> ClientBuilder {
    Client::builder()
        .use_rustls_tls() // Use rust-tls backend
        .tls_built_in_native_certs(true) // Load system (native) certificates
        .timeout(config.timeout)
        .connect_timeout(config.conn_timeout)
}

/// [HttpClient] implementation backed by a reqwest blocking client.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Builds a reqwest blocking client according to the provided configuration.
    pub fn try_new(config: &HttpConfig) -> Result<Self, HttpClientError> {
        let client = reqwest_builder_with_timeout(config)
            .build()
            .map_err(|err| HttpClientError::BuildingError(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        let request = reqwest::blocking::Request::try_from(request)
            .map_err(|err| HttpClientError::BuildingError(err.to_string()))?;
        let res = self.client.execute(request).map_err(|err| {
            if err.is_timeout() {
                HttpClientError::Timeout(err.to_string())
            } else {
                HttpClientError::TransportError(err.to_string())
            }
        })?;
        try_build_response(res)
    }
}
