//! Fake Google Cloud and CircleCI endpoints served by a single mock server.
use gcp_keepalive::metadata::hostname::{instance_name, HostnameGetter, SystemHostnameGetter};
use httpmock::Method::{DELETE, GET};
use httpmock::{Mock, MockServer};

pub const PIPELINE_ID: &str = "5034460f-c7c4-4c43-9457-de07e2029e7b";
pub const API_TOKEN: &str = "CCIPAT_integration";
pub const ZONE: &str = "us-central1-c";
pub const PROJECT: &str = "ci-project";
pub const ACCESS_TOKEN: &str = "ya29.integration";

pub const METADATA_PATH: &str = "";
pub const PIPELINE_PATH: &str = "/api/v2";
pub const COMPUTE_PATH: &str = "/compute/v1";

/// Name the terminator derives from the hostname of the machine running the tests.
pub fn current_instance_name() -> String {
    let hostname = SystemHostnameGetter.hostname().unwrap();
    instance_name(&hostname).to_string()
}

pub fn mock_attribute<'a>(server: &'a MockServer, name: &str, value: &str) -> Mock<'a> {
    let value = value.to_string();
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/computeMetadata/v1/instance/attributes/{name}"))
            .header("Metadata-Flavor", "Google");
        then.status(200).body(value);
    })
}

/// Instance attributes of a build instance with a 1 minute self-destruct interval.
pub fn mock_build_instance(server: &MockServer) {
    mock_attribute(server, "CIRCLE_API_TOKEN", API_TOKEN);
    mock_attribute(server, "CIRCLE_PIPELINE_ID", PIPELINE_ID);
    mock_attribute(server, "SELF_DESTRUCT_INTERVAL_MINUTES", "1");

    server.mock(|when, then| {
        when.method(GET).path("/computeMetadata/v1/instance/zone");
        then.status(200)
            .body(format!("projects/123456789/zones/{ZONE}"));
    });
    server.mock(|when, then| {
        when.method(GET).path("/computeMetadata/v1/project/project-id");
        then.status(200).body(PROJECT);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/computeMetadata/v1/instance/service-accounts/default/token");
        then.status(200).body(format!(
            r#"{{"access_token": "{ACCESS_TOKEN}", "expires_in": 3599, "token_type": "Bearer"}}"#
        ));
    });
}

pub fn mock_workflows<'a>(server: &'a MockServer, status: u16, body: &str) -> Mock<'a> {
    let body = body.to_string();
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("{PIPELINE_PATH}/pipeline/{PIPELINE_ID}/workflow"))
            .header("Circle-Token", API_TOKEN);
        then.status(status).body(body);
    })
}

pub fn mock_delete(server: &MockServer, status: u16) -> Mock<'_> {
    let path = format!(
        "{COMPUTE_PATH}/projects/{PROJECT}/zones/{ZONE}/instances/{}",
        current_instance_name()
    );
    server.mock(|when, then| {
        when.method(DELETE)
            .path(path)
            .header("Authorization", format!("Bearer {ACCESS_TOKEN}"));
        then.status(status)
            .body(r#"{"kind": "compute#operation", "name": "operation-1"}"#);
    })
}
