//! HTTP Handlers for the pin store

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, PathRejection, QueryRejection},
    },
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{PinRequest, ReorderRequest, UnpinParams};
use crate::error::{ApiError, PinError};
use crate::handler::AppState;
use crate::kv::KeyValueStore;
use crate::model::{PinList, PinnedRepository, RepoId};

type PinResult = Result<Json<PinList>, ApiError>;

fn parse_body<T: DeserializeOwned>(body: &[u8], invalid_shape: &str) -> Result<T, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::info!(error = %e, "rejecting request body that is not JSON");
        ApiError::bad_request("Invalid JSON in request body", e)
    })?;
    serde_json::from_value(value).map_err(|e| ApiError::bad_request(invalid_shape, e))
}

pub async fn list_pins<K: KeyValueStore>(
    State(state): State<AppState<K>>,
    username: Result<Path<String>, PathRejection>,
) -> PinResult {
    let Path(username) = username?;
    let pins = state.pins.get(&username).await?;

    tracing::info!(username = %username, count = pins.len(), "listed pinned repositories");
    Ok(Json(pins))
}

pub async fn pin_repo<K: KeyValueStore>(
    State(state): State<AppState<K>>,
    username: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> PinResult {
    let Path(username) = username?;
    let request: PinRequest = parse_body(&body?, "Invalid repository data")?;
    let repo = PinnedRepository::from_json(request.repo)?;
    let repo_id = repo.id.clone();

    let pins = state.pins.add(&username, repo).await?;

    tracing::info!(username = %username, repo_id = %repo_id, count = pins.len(), "pinned repository");
    Ok(Json(pins))
}

pub async fn unpin_repo<K: KeyValueStore>(
    State(state): State<AppState<K>>,
    username: Result<Path<String>, PathRejection>,
    params: Result<Query<UnpinParams>, QueryRejection>,
) -> PinResult {
    let Path(username) = username?;
    let Query(params) = params?;
    let repo_id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| PinError::validation("Missing repo ID"))?;

    let pins = state.pins.remove(&username, &repo_id).await?;

    tracing::info!(username = %username, repo_id = %repo_id, count = pins.len(), "unpinned repository");
    Ok(Json(pins))
}

pub async fn reorder_pins<K: KeyValueStore>(
    State(state): State<AppState<K>>,
    username: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> PinResult {
    let Path(username) = username?;
    let request: ReorderRequest =
        parse_body(&body?, "repoIds must be an array of repository ids")?;
    let repo_ids = RepoId::list_from_json(request.repo_ids)?;

    let pins = state.pins.reorder(&username, &repo_ids).await?;

    tracing::info!(username = %username, count = pins.len(), "reordered pinned repositories");
    Ok(Json(pins))
}
