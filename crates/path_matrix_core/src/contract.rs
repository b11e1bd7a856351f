use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_TABLE_NAME: &str = "paths";
pub const SOURCE_ATTRIBUTE: &str = "source";
pub const DESTINATION_ATTRIBUTE: &str = "destination";
pub const DISTANCE_ATTRIBUTE: &str = "distance";

/// Body returned on every failed refresh, whatever the cause.
pub const REFRESH_FAILURE_MESSAGE: &str = "Failed to connect to the dynamodb";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshRequest {
    pub graph: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RefreshResponse {
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            body: None,
        }
    }

    /// Fixed 500 response. The body is the JSON encoding of
    /// [`REFRESH_FAILURE_MESSAGE`], quotes included.
    pub fn failure() -> Self {
        Self {
            status_code: 500,
            body: Some(serde_json::Value::from(REFRESH_FAILURE_MESSAGE).to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Primary key of a persisted row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistanceRow {
    pub source: String,
    pub destination: String,
    pub distance: i64,
}

impl DistanceRow {
    pub fn key(&self) -> RowKey {
        RowKey {
            source: self.source.clone(),
            destination: self.destination.clone(),
        }
    }
}

/// Stable SHA-256 fingerprint of the raw edge list, for correlating log lines.
pub fn graph_fingerprint(graph_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(graph_text.as_bytes());
    format!("{:x}", hasher.finalize())
}
