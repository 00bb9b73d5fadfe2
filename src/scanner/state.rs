use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{FacingMode, SessionConfig};
use crate::models::DetectionResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScanState {
    #[default]
    Idle,
    Starting,
    Scanning,
    Stopped,
    Failed,
}

impl ScanState {
    /// Starting or Scanning: a camera is held or being acquired.
    pub fn is_live(self) -> bool {
        matches!(self, ScanState::Starting | ScanState::Scanning)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerSnapshot {
    pub state: ScanState,
    pub scanning: bool,
    pub session_id: Option<Uuid>,
    pub last_found: Option<DetectionResult>,
    /// Message for the presentation layer after a failed start or timeout.
    pub last_error: Option<String>,
    pub supports_camera_switch: bool,
    pub current_camera: FacingMode,
    pub history_count: usize,
    pub config: SessionConfig,
}
