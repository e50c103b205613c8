use duration_str::deserialize_duration;
use serde::Deserialize;
use std::time::Duration;

/// Default timeout for a whole request, including reading the response body.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default timeout for establishing the connection.
pub const DEFAULT_CONN_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts applied to every outgoing request, so a hung endpoint can never stall the agent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub conn_timeout: Duration,
}

impl HttpConfig {
    pub fn new(timeout: Duration, conn_timeout: Duration) -> Self {
        Self {
            timeout,
            conn_timeout,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_TIMEOUT, DEFAULT_CONN_TIMEOUT)
    }
}
