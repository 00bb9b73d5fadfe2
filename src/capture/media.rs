//! Camera/media acquisition boundary. Implemented by platform backends and by
//! test doubles; the scanner only ever talks to these traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{FacingMode, SessionConfig};
use crate::error::MediaError;

use super::Frame;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub device_id: Option<String>,
}

impl VideoConstraints {
    pub fn new(facing_mode: FacingMode, config: &SessionConfig) -> Self {
        let (width, height) = config.resolution.ideal_size();
        Self {
            facing_mode,
            width: Some(width),
            height: Some(height),
            device_id: config.device_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInputDevice {
    pub device_id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, MediaError>;

    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoInputDevice>, MediaError>;
}

#[async_trait]
pub trait VideoStream: Send + Sync {
    /// Resolves once the first decodable frame is available.
    async fn ready(&self) -> Result<FrameSize, MediaError>;

    fn tracks(&self) -> Vec<Arc<dyn VideoTrack>>;

    /// Latest frame as RGBA8, or `None` while the stream has no data yet.
    fn grab_frame(&self) -> Option<Frame>;
}

#[async_trait]
pub trait VideoTrack: Send + Sync {
    fn id(&self) -> String;

    fn stop(&self);

    fn torch_capable(&self) -> bool;

    fn torch_enabled(&self) -> bool;

    async fn set_torch(&self, on: bool) -> Result<(), MediaError>;
}

/// For hosts without a camera. Static-image scans still work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMediaDevices;

#[async_trait]
impl MediaDevices for NoMediaDevices {
    async fn acquire_video_stream(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, MediaError> {
        Err(MediaError::DeviceNotFound)
    }

    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoInputDevice>, MediaError> {
        Ok(Vec::new())
    }
}
