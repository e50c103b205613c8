#[cfg(unix)]
use nix::unistd::gethostname;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("could not get the hostname: `{0}`")]
pub struct HostnameError(String);

impl HostnameError {
    pub(crate) fn empty() -> Self {
        Self("empty hostname".to_string())
    }
}

/// Wrapper for a hostname getter.
pub trait HostnameGetter {
    fn hostname(&self) -> Result<String, HostnameError>;
}

/// Reads the hostname from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostnameGetter;

impl HostnameGetter for SystemHostnameGetter {
    #[cfg(unix)]
    fn hostname(&self) -> Result<String, HostnameError> {
        gethostname()
            .map_err(|e| HostnameError(e.to_string()))?
            .into_string()
            .map_err(|raw| HostnameError(format!("non UTF-8 hostname {raw:?}")))
    }

    #[cfg(not(unix))]
    fn hostname(&self) -> Result<String, HostnameError> {
        std::env::var("COMPUTERNAME").map_err(|e| HostnameError(e.to_string()))
    }
}

/// Compute Engine sets the hostname to the instance name, possibly qualified with the internal
/// DNS suffix (`<name>.c.<project>.internal`). Returns the instance name part.
pub fn instance_name(hostname: &str) -> &str {
    hostname
        .split_once('.')
        .map_or(hostname, |(name, _)| name)
}
