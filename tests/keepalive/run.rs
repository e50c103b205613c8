use crate::common::{
    mock_build_instance, mock_delete, mock_workflows, COMPUTE_PATH, METADATA_PATH, PIPELINE_PATH,
};
use assert_matches::assert_matches;
use gcp_keepalive::agent::error::AgentError;
use gcp_keepalive::agent::run::{run, RunError};
use gcp_keepalive::agent::StopReason;
use gcp_keepalive::config::AgentConfig;
use gcp_keepalive::metadata::MetadataConfig;
use gcp_keepalive::pipeline::{PipelineConfig, PipelineError};
use gcp_keepalive::terminator::{Termination, TerminatorConfig};
use httpmock::MockServer;
use std::time::Duration;
use url::Url;

fn config_for(server: &MockServer) -> AgentConfig {
    AgentConfig {
        metadata: MetadataConfig::with_endpoint(Url::parse(&server.url(METADATA_PATH)).unwrap()),
        pipeline: PipelineConfig {
            endpoint: Url::parse(&server.url(PIPELINE_PATH)).unwrap(),
            ..Default::default()
        },
        terminator: TerminatorConfig {
            compute_endpoint: Url::parse(&server.url(COMPUTE_PATH)).unwrap(),
            ..Default::default()
        },
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    }
}

#[test]
fn finished_pipeline_deletes_the_instance() {
    let server = MockServer::start();
    mock_build_instance(&server);
    let workflows = mock_workflows(
        &server,
        200,
        r#"{"items": [{"id": "w1", "name": "build", "status": "success"}], "next_page_token": null}"#,
    );
    let delete = mock_delete(&server, 200);

    let report = run(&config_for(&server)).unwrap();

    workflows.assert();
    delete.assert();
    assert_eq!(report.polls, 1);
    assert_eq!(report.reason, StopReason::PipelineFinished);
    assert_eq!(report.termination, Termination::Requested);
}

#[test]
fn already_deleted_instance_is_not_an_error() {
    let server = MockServer::start();
    mock_build_instance(&server);
    mock_workflows(&server, 200, r#"{"items": []}"#);
    let delete = mock_delete(&server, 404);

    let report = run(&config_for(&server)).unwrap();

    delete.assert();
    assert_eq!(report.termination, Termination::AlreadyGone);
}

#[test]
fn pipeline_failure_keeps_the_instance() {
    let server = MockServer::start();
    mock_build_instance(&server);
    let workflows = mock_workflows(&server, 401, r#"{"message": "Unauthorized"}"#);
    let delete = mock_delete(&server, 200);

    let result = run(&config_for(&server));

    workflows.assert();
    delete.assert_calls(0);
    assert_matches!(
        result,
        Err(RunError::Agent(AgentError::Pipeline(
            PipelineError::UnsuccessfulResponse(401, _)
        )))
    );
}

#[test]
fn failed_polls_are_retried_when_configured() {
    let server = MockServer::start();
    mock_build_instance(&server);
    let workflows = mock_workflows(&server, 503, "");
    let delete = mock_delete(&server, 200);
    let mut config = config_for(&server);
    config.pipeline.max_poll_attempts = 3;
    config.pipeline.retry_interval = Duration::from_millis(10);

    let result = run(&config);

    workflows.assert_calls(3);
    delete.assert_calls(0);
    assert_matches!(result, Err(RunError::Agent(AgentError::Pipeline(_))));
}
