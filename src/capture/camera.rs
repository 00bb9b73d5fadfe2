use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use log::{debug, info, warn};

use crate::config::{FacingMode, SessionConfig};
use crate::error::ScanError;
use crate::utils::lock;

use super::frame::{Frame, FrameSource};
use super::media::{FrameSize, MediaDevices, VideoConstraints, VideoStream};

/// Sole owner of the live camera stream.
///
/// Every `start`/`stop` bumps `epoch`; an acquisition that finishes under a
/// stale epoch releases its stream instead of installing it.
pub struct CameraSession {
    devices: Arc<dyn MediaDevices>,
    stream: Mutex<Option<Box<dyn VideoStream>>>,
    facing_mode: Mutex<FacingMode>,
    frame_size: Mutex<Option<FrameSize>>,
    supports_camera_switch: AtomicBool,
    epoch: AtomicU64,
}

/// Stops every track of a stream on drop unless disarmed.
struct StreamGuard(Option<Box<dyn VideoStream>>);

impl StreamGuard {
    fn disarm(mut self) -> Option<Box<dyn VideoStream>> {
        self.0.take()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(stream) = self.0.take() {
            release(stream.as_ref());
        }
    }
}

fn release(stream: &dyn VideoStream) {
    for track in stream.tracks() {
        debug!("stopping video track {}", track.id());
        track.stop();
    }
}

impl CameraSession {
    pub fn new(devices: Arc<dyn MediaDevices>, facing_mode: FacingMode) -> Self {
        Self {
            devices,
            stream: Mutex::new(None),
            facing_mode: Mutex::new(facing_mode),
            frame_size: Mutex::new(None),
            supports_camera_switch: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Acquire a stream for the current facing mode and wait for its first frame.
    pub async fn start(&self, config: &SessionConfig) -> Result<FrameSize, ScanError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.release_current();

        let constraints = VideoConstraints::new(self.facing_mode(), config);
        info!(
            "requesting camera: facing={:?} size={:?}x{:?} device={:?}",
            constraints.facing_mode, constraints.width, constraints.height, constraints.device_id
        );

        let mut guard = StreamGuard(None);
        let stream = guard
            .0
            .insert(self.devices.acquire_video_stream(&constraints).await?);
        self.ensure_current(epoch)?;

        let size = stream.ready().await?;
        self.ensure_current(epoch)?;

        let supports_switch = match self.devices.enumerate_video_inputs().await {
            Ok(devices) => {
                debug!("{} video inputs available", devices.len());
                devices.len() > 1
            }
            Err(err) => {
                warn!("could not enumerate video inputs: {err}");
                false
            }
        };

        {
            let mut slot = lock(&self.stream);
            // Checked under the slot lock so a concurrent stop() either sees
            // the installed stream or makes us drop it.
            self.ensure_current(epoch)?;
            *slot = guard.disarm();
        }
        self.supports_camera_switch
            .store(supports_switch, Ordering::SeqCst);
        *lock(&self.frame_size) = Some(size);

        info!("camera ready at {}x{}", size.width, size.height);
        Ok(size)
    }

    /// Release every track. Safe to call repeatedly or before any start.
    pub fn stop(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.release_current() {
            info!("camera released");
        }
    }

    /// Flip between front and rear cameras, reacquiring only if a stream is live.
    /// A failed reacquisition keeps the previous facing mode.
    pub async fn switch_camera(&self, config: &SessionConfig) -> Result<FacingMode, ScanError> {
        if !self.supports_camera_switch() {
            return Err(ScanError::unsupported("device has a single camera"));
        }

        let was_active = self.is_active();
        if was_active {
            self.stop();
        }

        let previous = {
            let mut facing = lock(&self.facing_mode);
            let previous = *facing;
            *facing = previous.flipped();
            previous
        };
        let facing_mode = previous.flipped();
        info!("switching camera to {facing_mode:?}");

        if was_active {
            if let Err(err) = self.start(config).await {
                warn!("could not reacquire camera after switch, keeping {previous:?}: {err}");
                self.set_facing_mode(previous);
                return Err(err);
            }
        }
        Ok(facing_mode)
    }

    pub async fn toggle_torch(&self) -> Result<bool, ScanError> {
        let track = {
            let slot = lock(&self.stream);
            let Some(stream) = slot.as_ref() else {
                return Err(ScanError::NotStarted);
            };
            stream.tracks().into_iter().next()
        };
        let Some(track) = track else {
            return Err(ScanError::NotStarted);
        };

        if !track.torch_capable() {
            return Err(ScanError::unsupported("camera has no torch"));
        }

        let enabled = !track.torch_enabled();
        track.set_torch(enabled).await?;
        Ok(enabled)
    }

    pub fn is_active(&self) -> bool {
        lock(&self.stream).is_some()
    }

    pub fn supports_camera_switch(&self) -> bool {
        self.supports_camera_switch.load(Ordering::SeqCst)
    }

    pub fn facing_mode(&self) -> FacingMode {
        *lock(&self.facing_mode)
    }

    pub fn set_facing_mode(&self, facing_mode: FacingMode) {
        *lock(&self.facing_mode) = facing_mode;
    }

    pub fn frame_size(&self) -> Option<FrameSize> {
        *lock(&self.frame_size)
    }

    fn ensure_current(&self, epoch: u64) -> Result<(), ScanError> {
        if self.epoch.load(Ordering::SeqCst) == epoch {
            Ok(())
        } else {
            info!("camera acquisition superseded; releasing stream");
            Err(ScanError::Cancelled)
        }
    }

    fn release_current(&self) -> bool {
        let stream = lock(&self.stream).take();
        *lock(&self.frame_size) = None;
        match stream {
            Some(stream) => {
                release(stream.as_ref());
                true
            }
            None => false,
        }
    }
}

impl FrameSource for CameraSession {
    fn current_frame(&self) -> Option<Frame> {
        lock(&self.stream).as_ref().and_then(|stream| stream.grab_frame())
    }
}
