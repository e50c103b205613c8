use super::Workflow;

/// Returns `false` if any workflow is still running and `true` otherwise, including when no
/// workflow is reported at all.
pub fn should_terminate(workflows: &[Workflow]) -> bool {
    !workflows.iter().any(Workflow::is_running)
}
