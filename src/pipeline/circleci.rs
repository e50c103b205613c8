//! CircleCI v2 API pipeline status client
use super::{ApiToken, PipelineError, PipelineStatusClient, Workflow};
use crate::http::client::{canonical_reason, HttpClient};
use http::header::{HeaderName, HeaderValue, ACCEPT};
use http::HeaderMap;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

const CIRCLE_TOKEN_HEADER: &str = "circle-token";
const PAGE_TOKEN_PARAM: &str = "page-token";
const MAX_PAGES: usize = 50;

/// One page of `GET /pipeline/{id}/workflow`.
#[derive(Debug, Deserialize)]
struct WorkflowPage {
    #[serde(default)]
    items: Vec<Workflow>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Lists the workflows of a pipeline through the CircleCI v2 API.
pub struct CircleCiClient<C: HttpClient> {
    http_client: C,
    endpoint: Url,
}

impl<C: HttpClient> CircleCiClient<C> {
    pub fn new(http_client: C, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    fn headers(api_token: &ApiToken) -> Result<HeaderMap, PipelineError> {
        let mut token =
            HeaderValue::from_str(api_token.expose()).map_err(|_| PipelineError::InvalidToken)?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(CIRCLE_TOKEN_HEADER), token);
        Ok(headers)
    }

    fn url(&self, pipeline_id: &str, page_token: Option<&str>) -> Result<Url, PipelineError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| PipelineError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["pipeline", pipeline_id, "workflow"]);
        if let Some(page_token) = page_token {
            url.query_pairs_mut()
                .append_pair(PAGE_TOKEN_PARAM, page_token);
        }
        Ok(url)
    }

    fn get_page(
        &self,
        pipeline_id: &str,
        page_token: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<WorkflowPage, PipelineError> {
        let url = self.url(pipeline_id, page_token)?;
        let response = self.http_client.get(url.as_str(), headers.clone())?;

        if !response.status().is_success() {
            return Err(PipelineError::UnsuccessfulResponse(
                response.status().as_u16(),
                canonical_reason(&response),
            ));
        }

        Ok(serde_json::from_slice(response.body())?)
    }
}

impl<C: HttpClient> PipelineStatusClient for CircleCiClient<C> {
    fn list_workflows(
        &self,
        pipeline_id: &str,
        api_token: &ApiToken,
    ) -> Result<Vec<Workflow>, PipelineError> {
        let headers = Self::headers(api_token)?;
        let mut workflows = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.get_page(pipeline_id, page_token.as_deref(), &headers)?;
            workflows.extend(page.items);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => {
                    debug!(pipeline_id, workflows = workflows.len(), "pipeline workflows listed");
                    return Ok(workflows);
                }
            }
        }

        warn!(pipeline_id, "pipeline workflows exceed {MAX_PAGES} pages, ignoring the rest");
        Ok(workflows)
    }
}
