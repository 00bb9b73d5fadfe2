use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError, Weak,
};

use chrono::Utc;
use image::DynamicImage;
use log::{debug, info, warn};
use tokio::{task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::audio::Vibrator;
use crate::capture::{still_image, CameraSession, Frame, MediaDevices};
use crate::classifier::classify;
use crate::config::{FacingMode, SessionConfig};
use crate::decoder::QrDecoder;
use crate::error::ScanError;
use crate::models::{DetectionResult, DetectionSource, RegionOffset, ScanHistoryEntry, QR_CODE_FORMAT};
use crate::utils::lock;

use super::loop_worker::{detect_in_frame, LoopExit, ScanContext, ScanLoop};
use super::state::{ScanState, ScannerSnapshot};

struct Runtime {
    state: ScanState,
    config: Arc<SessionConfig>,
    session_id: Option<Uuid>,
    last_error: Option<String>,
    loop_token: Option<CancellationToken>,
    timeout: Option<JoinHandle<()>>,
}

struct Inner {
    camera: Arc<CameraSession>,
    decoder: Arc<dyn QrDecoder>,
    context: Arc<ScanContext>,
    runtime: Mutex<Runtime>,
    /// Bumped by every start and stop. Async work started under an older
    /// value must not touch the session when it resumes.
    epoch: AtomicU64,
}

/// One scanning session: camera, scan loop, debouncer and history.
///
/// Cheap to clone; clones share the session. Dropping the last clone stops
/// the loop and releases the camera.
#[derive(Clone)]
pub struct ScanSessionController {
    inner: Arc<Inner>,
}

impl ScanSessionController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        decoder: Arc<dyn QrDecoder>,
        config: SessionConfig,
    ) -> Self {
        let camera = Arc::new(CameraSession::new(devices, config.facing_mode));
        let context = Arc::new(ScanContext::new(&config));

        Self {
            inner: Arc::new(Inner {
                camera,
                decoder,
                context,
                runtime: Mutex::new(Runtime {
                    state: ScanState::Idle,
                    config: Arc::new(config),
                    session_id: None,
                    last_error: None,
                    loop_token: None,
                    timeout: None,
                }),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Acquire the camera and begin polling frames.
    ///
    /// Already Starting or Scanning is a no-op. If `stop()` lands while the
    /// camera is still being acquired, this returns `ScanError::Cancelled`
    /// and the session stays Stopped.
    pub async fn start(&self) -> Result<(), ScanError> {
        let (epoch, config) = {
            let mut runtime = lock(&self.inner.runtime);
            if runtime.state.is_live() {
                debug!("start() ignored: session already {:?}", runtime.state);
                return Ok(());
            }
            let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            let session_id = Uuid::new_v4();
            runtime.state = ScanState::Starting;
            runtime.session_id = Some(session_id);
            runtime.last_error = None;
            info!("starting scan session {session_id}");
            (epoch, runtime.config.clone())
        };
        self.inner.context.begin_cycle(&config);

        let acquired = self.inner.camera.start(&config).await;

        let mut runtime = lock(&self.inner.runtime);
        if !self.inner.is_current(epoch) {
            // stop() already released whatever the camera handed back.
            info!("start superseded while acquiring the camera");
            return Err(ScanError::Cancelled);
        }

        match acquired {
            Ok(size) => {
                runtime.state = ScanState::Scanning;
                runtime.loop_token = Some(self.spawn_loop(epoch, config.clone()));
                if config.timeout_ms > 0 {
                    runtime.timeout = Some(self.spawn_timeout(epoch, config.timeout_ms));
                }
                info!("scanning {}x{} frames", size.width, size.height);
                Ok(())
            }
            Err(err) => {
                drop(runtime);
                self.inner.fail(epoch, &err);
                Err(err)
            }
        }
    }

    /// Stop scanning and release the camera. Never fails; safe to repeat.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Flip between front and rear cameras.
    ///
    /// Only a live stream is reacquired; otherwise the new facing mode is
    /// kept for the next start.
    pub async fn switch_camera(&self) -> Result<FacingMode, ScanError> {
        let (epoch, config) = {
            let runtime = lock(&self.inner.runtime);
            (self.inner.epoch.load(Ordering::SeqCst), runtime.config.clone())
        };

        match self.inner.camera.switch_camera(&config).await {
            Ok(facing_mode) => {
                let mut runtime = lock(&self.inner.runtime);
                let mut updated = (*runtime.config).clone();
                updated.facing_mode = facing_mode;
                runtime.config = Arc::new(updated);
                Ok(facing_mode)
            }
            Err(err @ ScanError::Unsupported(_)) => Err(err),
            Err(err) => {
                self.inner.fail(epoch, &err);
                Err(err)
            }
        }
    }

    /// Toggle the torch on the active track and return the new state.
    pub async fn toggle_flash(&self) -> Result<bool, ScanError> {
        let enabled = self.inner.camera.toggle_torch().await?;
        debug!("torch {}", if enabled { "on" } else { "off" });
        Ok(enabled)
    }

    /// Replace the session config.
    ///
    /// A live session is restarted when a camera-affecting field changed;
    /// other fields apply from the next start. History size applies now.
    pub async fn reconfigure(&self, config: SessionConfig) -> Result<(), ScanError> {
        let restart = {
            let mut runtime = lock(&self.inner.runtime);
            let restart =
                runtime.state.is_live() && runtime.config.camera_affecting_change(&config);
            lock(&self.inner.context.history).set_max_size(config.history_max_size);
            self.inner.camera.set_facing_mode(config.facing_mode);
            runtime.config = Arc::new(config);
            restart
        };

        if restart {
            info!("camera settings changed; restarting session");
            self.stop();
            self.start().await?;
        }
        Ok(())
    }

    /// One-shot scan of a still image. Bypasses the debouncer and history
    /// and fires no callbacks.
    pub fn scan_image(&self, image: &DynamicImage) -> Option<DetectionResult> {
        self.scan_frame(&Frame::from_image(image))
    }

    pub fn scan_frame(&self, frame: &Frame) -> Option<DetectionResult> {
        let config = self.config();
        match detect_in_frame(
            self.inner.decoder.as_ref(),
            frame,
            config.scan_region,
            config.inversion,
            DetectionSource::StaticImage,
        ) {
            Ok(result) => result,
            Err(err) => {
                warn!("static scan failed: {err}");
                None
            }
        }
    }

    pub async fn scan_image_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Option<DetectionResult>, ScanError> {
        let image = still_image::load_image_file(path.as_ref()).await?;
        Ok(self.scan_image(&image))
    }

    pub async fn scan_image_from_url(
        &self,
        url: &str,
    ) -> Result<Option<DetectionResult>, ScanError> {
        let image = still_image::load_image_url(url).await?;
        Ok(self.scan_image(&image))
    }

    /// Classify user-typed text as if it had been scanned. Notifies `found`
    /// observers but is not written to history.
    pub fn process_manual_entry(&self, text: &str) -> DetectionResult {
        let result = DetectionResult {
            payload: text.to_string(),
            location: None,
            timestamp_ms: Utc::now().timestamp_millis(),
            content_type: classify(text),
            source_region_offset: RegionOffset::default(),
            format: QR_CODE_FORMAT.to_string(),
            source: DetectionSource::Manual,
        };
        self.inner.context.observers.notify_found(&result);
        result
    }

    pub fn get_history(&self) -> Vec<ScanHistoryEntry> {
        lock(&self.inner.context.history).list()
    }

    pub fn clear_history(&self) {
        lock(&self.inner.context.history).clear();
    }

    pub fn set_history_max_size(&self, max_size: usize) {
        lock(&self.inner.context.history).set_max_size(max_size);
    }

    pub fn get_state(&self) -> ScannerSnapshot {
        let runtime = lock(&self.inner.runtime);
        ScannerSnapshot {
            state: runtime.state,
            scanning: runtime.state == ScanState::Scanning,
            session_id: runtime.session_id,
            last_found: lock(&self.inner.context.last_found).clone(),
            last_error: runtime.last_error.clone(),
            supports_camera_switch: self.inner.camera.supports_camera_switch(),
            current_camera: self.inner.camera.facing_mode(),
            history_count: lock(&self.inner.context.history).len(),
            config: (*runtime.config).clone(),
        }
    }

    pub fn state(&self) -> ScanState {
        lock(&self.inner.runtime).state
    }

    pub fn is_scanning(&self) -> bool {
        self.state() == ScanState::Scanning
    }

    pub fn config(&self) -> Arc<SessionConfig> {
        lock(&self.inner.runtime).config.clone()
    }

    pub fn on_found(&self, callback: impl Fn(&DetectionResult) + Send + Sync + 'static) {
        self.inner.context.observers.on_found(Arc::new(callback));
    }

    pub fn on_error(&self, callback: impl Fn(&ScanError) + Send + Sync + 'static) {
        self.inner.context.observers.on_error(Arc::new(callback));
    }

    pub fn set_vibrator(&self, vibrator: Option<Arc<dyn Vibrator>>) {
        self.inner.context.feedback.set_vibrator(vibrator);
    }

    fn spawn_loop(&self, epoch: u64, config: Arc<SessionConfig>) -> CancellationToken {
        let token = CancellationToken::new();
        let scan_loop = ScanLoop::new(
            self.inner.camera.clone(),
            self.inner.decoder.clone(),
            config,
            self.inner.context.clone(),
        );

        let inner = Arc::downgrade(&self.inner);
        let loop_token = token.clone();
        tokio::spawn(async move {
            if scan_loop.run(loop_token).await == LoopExit::AutoStop {
                if let Some(inner) = inner.upgrade() {
                    inner.stop_if_current(epoch);
                }
            }
        });
        token
    }

    fn spawn_timeout(&self, epoch: u64, timeout_ms: u64) -> JoinHandle<()> {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            if let Some(inner) = inner.upgrade() {
                inner.handle_timeout(epoch);
            }
        })
    }
}

impl Inner {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn stop(&self) {
        let mut runtime = lock(&self.runtime);
        self.halt(&mut runtime);
    }

    fn stop_if_current(&self, epoch: u64) {
        let mut runtime = lock(&self.runtime);
        if self.is_current(epoch) {
            self.halt(&mut runtime);
        }
    }

    /// Cancel the loop and timeout, release the camera and leave the session
    /// Stopped (Idle stays Idle).
    fn halt(&self, runtime: &mut Runtime) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = runtime.loop_token.take() {
            token.cancel();
        }
        if let Some(timeout) = runtime.timeout.take() {
            timeout.abort();
        }
        self.camera.stop();

        if runtime.state != ScanState::Idle {
            if runtime.state != ScanState::Stopped {
                info!("scan session stopped (was {:?})", runtime.state);
            }
            runtime.state = ScanState::Stopped;
        }
    }

    /// Tear down after an unrecoverable error and report it. Ignored when the
    /// failing operation has already been superseded.
    fn fail(&self, epoch: u64, err: &ScanError) {
        {
            let mut runtime = lock(&self.runtime);
            if !self.is_current(epoch) {
                debug!("dropping stale error: {err}");
                return;
            }
            self.halt(&mut runtime);
            runtime.state = ScanState::Failed;
            runtime.last_error = Some(err.to_string());
        }
        warn!("scan session failed: {err}");
        self.context.observers.notify_error(err);
    }

    fn handle_timeout(&self, epoch: u64) {
        let err = {
            let mut runtime = lock(&self.runtime);
            if !self.is_current(epoch)
                || runtime.state != ScanState::Scanning
                || self.context.confirmed.load(Ordering::SeqCst)
            {
                return;
            }
            // This task is the timeout; don't abort it from inside.
            runtime.timeout.take();
            let err = ScanError::Timeout(runtime.config.timeout_ms);
            self.halt(&mut runtime);
            runtime.last_error = Some(err.to_string());
            err
        };
        warn!("{err}");
        self.context.observers.notify_error(&err);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let runtime = self
            .runtime
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = runtime.loop_token.take() {
            token.cancel();
        }
        if let Some(timeout) = runtime.timeout.take() {
            timeout.abort();
        }
        self.camera.stop();
    }
}
