use serde::{Deserialize, Serialize};

use super::{ContentType, DetectionResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub payload: String,
    pub timestamp_ms: i64,
    pub content_type: ContentType,
}

impl From<&DetectionResult> for ScanHistoryEntry {
    fn from(result: &DetectionResult) -> Self {
        Self {
            payload: result.payload.clone(),
            timestamp_ms: result.timestamp_ms,
            content_type: result.content_type,
        }
    }
}
