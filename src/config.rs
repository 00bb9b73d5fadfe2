use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    /// Rear camera.
    #[default]
    Environment,
    /// Front camera.
    User,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Resolution {
    #[serde(rename = "sd")]
    Sd,
    #[default]
    #[serde(rename = "hd")]
    Hd,
    #[serde(rename = "full-hd")]
    FullHd,
}

impl Resolution {
    /// Ideal capture size requested from the camera.
    pub fn ideal_size(self) -> (u32, u32) {
        match self {
            Resolution::Sd => (640, 480),
            Resolution::Hd => (1280, 720),
            Resolution::FullHd => (1920, 1080),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScanRegion {
    #[default]
    Full,
    /// Centered crop covering half the width and half the height.
    Center,
}

/// How hard the decoder should try with inverted (light-on-dark) codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InversionMode {
    #[default]
    AttemptBoth,
    DontInvert,
    OnlyInvert,
    InvertFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub facing_mode: FacingMode,
    pub resolution: Resolution,
    pub scan_region: ScanRegion,
    /// Preferred video input; `None` lets the backend pick by facing mode.
    pub device_id: Option<String>,
    pub scan_interval_ms: u64,
    /// Consecutive positive frames needed before a detection is confirmed.
    pub success_tolerance: u32,
    pub duplicate_window_ms: u64,
    pub auto_stop: bool,
    /// 0 disables the timeout.
    pub timeout_ms: u64,
    pub inversion: InversionMode,
    pub beep_on_success: bool,
    pub vibrate: bool,
    pub history_max_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::default(),
            resolution: Resolution::default(),
            scan_region: ScanRegion::default(),
            device_id: None,
            scan_interval_ms: 100,
            success_tolerance: 3,
            duplicate_window_ms: 2000,
            auto_stop: false,
            timeout_ms: 0,
            inversion: InversionMode::default(),
            beep_on_success: false,
            vibrate: false,
            history_max_size: 20,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scanner config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid scanner config in {}", path.display()))
    }

    /// Whether moving from `self` to `other` needs the camera to be reacquired.
    pub fn camera_affecting_change(&self, other: &SessionConfig) -> bool {
        self.facing_mode != other.facing_mode
            || self.resolution != other.resolution
            || self.scan_region != other.scan_region
            || self.device_id != other.device_id
    }
}
