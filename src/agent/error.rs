use crate::pipeline::PipelineError;
use crate::terminator::TerminateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("could not get the pipeline status: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("could not terminate the instance: {0}")]
    Terminate(#[from] TerminateError),
}
