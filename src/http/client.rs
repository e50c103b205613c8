use http::{HeaderMap, Method, Request, Response};
use thiserror::Error;

/// An enumeration of potential errors related to the HTTP client.
#[derive(Error, Debug)]
pub enum HttpClientError {
    /// The request could not be built.
    #[error("could not build the HTTP request: `{0}`")]
    BuildingError(String),
    /// The request did not complete before the configured timeout.
    #[error("HTTP request timed out: `{0}`")]
    Timeout(String),
    /// Connection or protocol level failure.
    #[error("transport HTTP client error: `{0}`")]
    TransportError(String),
    /// The response could not be read.
    #[error("invalid HTTP response: `{0}`")]
    ResponseError(String),
}

impl HttpClientError {
    /// Returns true when the request was aborted because of the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The `HttpClient` trait defines the HTTP send interface to be implemented
/// by HTTP clients.
pub trait HttpClient {
    /// Returns a `http::Response<Vec<u8>>` structure as the HTTP response or
    /// HttpClientError if an error was found.
    ///
    /// Responses with any status code are returned as `Ok`, checking the status is up to the caller.
    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError>;

    /// Performs a get request with the provided url and headers.
    fn get(&self, url: &str, headers: HeaderMap) -> Result<Response<Vec<u8>>, HttpClientError> {
        self.send(build_request(Method::GET, url, headers)?)
    }

    /// Performs a delete request with the provided url and headers.
    fn delete(&self, url: &str, headers: HeaderMap) -> Result<Response<Vec<u8>>, HttpClientError> {
        self.send(build_request(Method::DELETE, url, headers)?)
    }
}

fn build_request(
    method: Method,
    url: &str,
    headers: HeaderMap,
) -> Result<Request<Vec<u8>>, HttpClientError> {
    let mut request = Request::builder()
        .method(method)
        .uri(url)
        .body(Vec::new())
        .map_err(|e| HttpClientError::BuildingError(e.to_string()))?;
    request.headers_mut().extend(headers);
    Ok(request)
}

/// Returns the canonical reason of the response status, or an empty string when unknown.
pub(crate) fn canonical_reason(response: &Response<Vec<u8>>) -> String {
    response
        .status()
        .canonical_reason()
        .unwrap_or_default()
        .to_string()
}
