use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const API_NAME: &str = "GitHub Extended Profile API";

pub const ENDPOINTS: [&str; 2] = ["/user/{username}/pinned", "/user/{username}/reorder"];

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub message: String,
    pub endpoints: Vec<String>,
}

impl DiscoveryResponse {
    pub fn new() -> Self {
        DiscoveryResponse {
            message: API_NAME.to_string(),
            endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for DiscoveryResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of `POST /user/{username}/pinned`. `repo` stays untyped here so a
/// missing id can be reported as a validation error.
#[derive(Debug, Deserialize, Serialize)]
pub struct PinRequest {
    #[serde(default)]
    pub repo: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReorderRequest {
    #[serde(default, rename = "repoIds")]
    pub repo_ids: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UnpinParams {
    pub id: Option<String>,
}
