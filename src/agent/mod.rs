//! Polling loop deciding when the instance deletes itself.
//!
//! The agent polls the pipeline until none of its workflows is running or the self-destruct
//! interval elapses, whichever happens first, and then terminates the instance exactly once.
pub mod clock;
pub mod config;
pub mod error;
pub mod run;

use crate::pipeline::decision::should_terminate;
use crate::pipeline::{PipelineError, PipelineStatusClient, Workflow};
use crate::terminator::{InstanceTerminator, Termination};
use clock::Clock;
use config::KeepaliveConfig;
use error::AgentError;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    /// Pause between two polls while the pipeline is running.
    pub interval: Duration,
    /// Attempts of a single poll. A value of 1 makes any poll failure fatal.
    pub max_attempts: u32,
    /// Pause between two attempts of the same poll.
    pub retry_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: 1,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Why the loop stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No workflow of the pipeline is running.
    PipelineFinished,
    /// The self-destruct interval elapsed.
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub polls: u32,
    pub reason: StopReason,
    pub termination: Termination,
}

pub struct KeepaliveAgent<P, T, K>
where
    P: PipelineStatusClient,
    T: InstanceTerminator,
    K: Clock,
{
    pipeline_client: P,
    terminator: T,
    clock: K,
    settings: PollSettings,
}

impl<P, T, K> KeepaliveAgent<P, T, K>
where
    P: PipelineStatusClient,
    T: InstanceTerminator,
    K: Clock,
{
    pub fn new(pipeline_client: P, terminator: T, clock: K, settings: PollSettings) -> Self {
        Self {
            pipeline_client,
            terminator,
            clock,
            settings,
        }
    }

    /// Runs the loop to completion. Any poll failure that exhausts its attempts aborts the run
    /// without terminating the instance, unless the self-destruct interval elapses while the
    /// poll is being retried.
    pub fn run(&self, config: &KeepaliveConfig) -> Result<RunReport, AgentError> {
        let span = info_span!("keepalive", pipeline_id = %config.pipeline_id);
        let _guard = span.enter();

        let self_destruct_minutes = config.self_destruct_interval.minutes();
        // None when the interval does not fit in the clock range.
        let deadline = self
            .clock
            .now()
            .checked_add(config.self_destruct_interval.as_duration());
        if deadline.is_none() {
            warn!(
                self_destruct_minutes,
                "Self-destruct interval is too long to be tracked, only the pipeline status stops the agent"
            );
        }
        info!(self_destruct_minutes, "Watching pipeline");

        let mut polls = 0;
        let reason = loop {
            if is_past(deadline, self.clock.now()) {
                warn!("Self-destruct interval elapsed, terminating regardless of the pipeline status");
                break StopReason::Timeout;
            }

            polls += 1;
            let Some(workflows) = self.poll(config, deadline)? else {
                warn!("Self-destruct interval elapses before the next poll attempt, terminating regardless of the pipeline status");
                break StopReason::Timeout;
            };
            debug!(statuses = %workflow_statuses(&workflows), "pipeline workflow statuses");
            if should_terminate(&workflows) {
                info!(polls, "Pipeline is no longer running");
                break StopReason::PipelineFinished;
            }

            info!(
                running = %running_workflows(&workflows),
                "Pipeline is still running"
            );
            self.clock.sleep(self.settings.interval);
        };

        let termination = self.terminator.terminate()?;
        info!(?reason, ?termination, "Instance termination issued");

        Ok(RunReport {
            polls,
            reason,
            termination,
        })
    }

    /// Fetches the workflows, retrying failed attempts. Returns `None` when the next attempt
    /// would start after the deadline.
    fn poll(
        &self,
        config: &KeepaliveConfig,
        deadline: Option<Instant>,
    ) -> Result<Option<Vec<Workflow>>, PipelineError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .pipeline_client
                .list_workflows(&config.pipeline_id, &config.api_token)
            {
                Ok(workflows) => {
                    debug!(attempt, workflows = workflows.len(), "pipeline status fetched");
                    return Ok(Some(workflows));
                }
                Err(err) if attempt < max_attempts => {
                    warn!(attempt, max_attempts, "failed to get the pipeline status: {err}");
                    let next_attempt = self.clock.now().checked_add(self.settings.retry_interval);
                    if deadline.is_some() && next_attempt.map_or(true, |at| is_past(deadline, at)) {
                        return Ok(None);
                    }
                    self.clock.sleep(self.settings.retry_interval);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// A missing deadline is never reached.
fn is_past(deadline: Option<Instant>, instant: Instant) -> bool {
    deadline.is_some_and(|deadline| instant > deadline)
}

fn workflow_statuses(workflows: &[Workflow]) -> String {
    workflows
        .iter()
        .map(|w| w.status.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn running_workflows(workflows: &[Workflow]) -> String {
    workflows
        .iter()
        .filter(|w| w.is_running())
        .map(|w| w.name.as_deref().unwrap_or("unnamed"))
        .collect::<Vec<_>>()
        .join(", ")
}
