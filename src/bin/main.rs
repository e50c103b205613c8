//! Keeps a CI build instance alive while its CircleCI pipeline runs, then deletes it.
use gcp_keepalive::agent::run::run;
use gcp_keepalive::cli::Command;
use gcp_keepalive::config::AgentConfig;
use std::error::Error;
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    Command::run(_main)
}

/// This is the actual main function.
///
/// It is separated from [main] to allow propagating the errors and log them in a string format.
fn _main(config: AgentConfig) -> Result<(), Box<dyn Error>> {
    let report = run(&config)?;
    info!(
        polls = report.polls,
        reason = ?report.reason,
        termination = ?report.termination,
        "keepalive finished"
    );
    Ok(())
}
