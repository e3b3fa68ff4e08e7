//! Composite Batch wire types.

use serde::{Deserialize, Serialize};

/// Largest number of subrequests in one Composite Batch call.
pub const MAX_BATCH_SUBREQUESTS: usize = 25;

/// A composite batch request containing multiple independent subrequests.
///
/// Batch subrequests are executed independently and cannot reference each
/// other's results. Available since API v34.0.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeBatchRequest {
    #[serde(rename = "batchRequests")]
    pub batch_requests: Vec<CompositeBatchSubrequest>,
    #[serde(rename = "haltOnError")]
    pub halt_on_error: bool,
}

/// A single subrequest within a composite batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBatchSubrequest {
    pub method: String,
    /// Path relative to `/services/data/`, e.g. `v62.0/sobjects/Account`.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "richInput")]
    pub rich_input: Option<serde_json::Value>,
}

impl CompositeBatchSubrequest {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            url: url.into(),
            rich_input: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.rich_input = Some(body);
        self
    }
}

/// Response from a composite batch request.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositeBatchResponse {
    #[serde(rename = "hasErrors")]
    pub has_errors: bool,
    pub results: Vec<CompositeBatchSubresponse>,
}

/// Response from a single batch subrequest.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositeBatchSubresponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl CompositeBatchSubresponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// One entry of a Salesforce error array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "errorCode")]
    pub error_code: String,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}
