use std::time::Duration;

use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::api::ErrorResponse;
use crate::model::{PinList, PinnedRepository, RepoId};

const SNIPPET_LEN: usize = 100;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    BaseUrl(String),

    #[error("request to pin service failed")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from pin service ({status}): {snippet}")]
    NonJson { status: u16, snippet: String },

    #[error("pin service returned {status}: {error}")]
    Api {
        status: u16,
        error: String,
        details: Option<String>,
    },
}

/// Typed client for the pin service HTTP API.
pub struct PinClient {
    client: Client,
    base_url: Url,
}

impl PinClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::BaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .user_agent(concat!("profile-pins/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(PinClient { client, base_url })
    }

    fn endpoint(&self, username: &str, leaf: &str) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["user", username, leaf]);
        Ok(url)
    }

    pub async fn pinned(&self, username: &str) -> Result<PinList, ClientError> {
        let url = self.endpoint(username, "pinned")?;
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    pub async fn pin(&self, username: &str, repo: &PinnedRepository) -> Result<PinList, ClientError> {
        let url = self.endpoint(username, "pinned")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "repo": repo }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn unpin(&self, username: &str, repo_id: &RepoId) -> Result<PinList, ClientError> {
        let mut url = self.endpoint(username, "pinned")?;
        url.query_pairs_mut().append_pair("id", &repo_id.to_string());
        let response = self.client.delete(url).send().await?;
        decode(response).await
    }

    pub async fn reorder(&self, username: &str, repo_ids: &[RepoId]) -> Result<PinList, ClientError> {
        let url = self.endpoint(username, "reorder")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "repoIds": repo_ids }))
            .send()
            .await?;
        decode(response).await
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

async fn decode(response: Response) -> Result<PinList, ClientError> {
    let status = response.status();

    if !is_json(&response) {
        let text = response.text().await.unwrap_or_default();
        tracing::error!(status = status.as_u16(), "non-JSON response from pin service");
        return Err(ClientError::NonJson {
            status: status.as_u16(),
            snippet: text.chars().take(SNIPPET_LEN).collect(),
        });
    }

    if !status.is_success() {
        let body: ErrorResponse = response.json().await?;
        return Err(ClientError::Api {
            status: status.as_u16(),
            error: body.error,
            details: body.details,
        });
    }

    Ok(response.json().await?)
}
