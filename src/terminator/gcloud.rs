//! Instance deletion through the `gcloud` CLI
use super::{InstanceIdentity, InstanceTerminator, TerminateError, Termination};
use crate::metadata::hostname::HostnameGetter;
use crate::metadata::MetadataReader;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const NOT_FOUND_MARKER: &str = "was not found";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs `gcloud compute instances delete <name> --zone=<zone> --quiet`.
///
/// The command uses whatever credentials `gcloud` is configured with on the instance. It is
/// killed if it does not exit within `command_timeout`.
pub struct GcloudTerminator<M, H>
where
    M: MetadataReader,
    H: HostnameGetter,
{
    metadata: M,
    hostname_getter: H,
    gcloud_path: PathBuf,
    command_timeout: Duration,
}

impl<M, H> GcloudTerminator<M, H>
where
    M: MetadataReader,
    H: HostnameGetter,
{
    pub fn new(
        metadata: M,
        hostname_getter: H,
        gcloud_path: PathBuf,
        command_timeout: Duration,
    ) -> Self {
        Self {
            metadata,
            hostname_getter,
            gcloud_path,
            command_timeout,
        }
    }

    fn args(identity: &InstanceIdentity) -> Vec<String> {
        vec![
            "compute".to_string(),
            "instances".to_string(),
            "delete".to_string(),
            identity.name.clone(),
            format!("--zone={}", identity.zone),
            "--quiet".to_string(),
        ]
    }

    fn command_error(&self, err: std::io::Error) -> TerminateError {
        TerminateError::Command(format!(
            "error executing {}: {err}",
            self.gcloud_path.display()
        ))
    }

    /// Runs the delete and collects its output. gcloud output is small enough to stay in the
    /// pipe buffers until the process exits.
    fn run_delete(&self, identity: &InstanceIdentity) -> Result<Output, TerminateError> {
        let mut child = Command::new(&self.gcloud_path)
            .args(Self::args(identity))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.command_error(e))?;

        // None when the timeout does not fit in the clock range, the command is then awaited.
        let deadline = Instant::now().checked_add(self.command_timeout);
        while child.try_wait().map_err(|e| self.command_error(e))?.is_none() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!(pid = child.id(), "gcloud did not finish in time, killing it");
                if let Err(err) = child.kill().and_then(|_| child.wait()) {
                    warn!("could not kill gcloud: {err}");
                }
                return Err(TerminateError::Timeout(self.command_timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }

        child.wait_with_output().map_err(|e| self.command_error(e))
    }
}

impl<M, H> InstanceTerminator for GcloudTerminator<M, H>
where
    M: MetadataReader,
    H: HostnameGetter,
{
    fn terminate(&self) -> Result<Termination, TerminateError> {
        let identity = InstanceIdentity::resolve(&self.metadata, &self.hostname_getter)?;

        info!(instance = %identity, "Requesting instance deletion with gcloud");
        let output = self.run_delete(&identity)?;

        if output.status.success() {
            debug!(stdout = %String::from_utf8_lossy(&output.stdout), "gcloud delete finished");
            return Ok(Termination::Requested);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(NOT_FOUND_MARKER) {
            info!(instance = %identity, "Instance not found, it was already deleted");
            return Ok(Termination::AlreadyGone);
        }

        Err(TerminateError::Command(format!(
            "gcloud exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}
