use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use chrono::Utc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::audio::Feedback;
use crate::capture::{Frame, FrameSource};
use crate::classifier::classify;
use crate::config::{InversionMode, ScanRegion, SessionConfig};
use crate::decoder::{DecodeOptions, QrDecoder};
use crate::error::DecodeError;
use crate::models::{DetectionResult, DetectionSource, ScanHistoryEntry, QR_CODE_FORMAT};
use crate::utils::lock;

use super::debounce::{DetectionDebouncer, Verdict};
use super::events::Observers;
use super::history::ScanHistory;

// Per-frame logging; flip off when profiling.
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Session-scoped state shared between the controller and its scan loop.
pub(crate) struct ScanContext {
    pub debouncer: Mutex<DetectionDebouncer>,
    pub history: Mutex<ScanHistory>,
    pub last_found: Mutex<Option<DetectionResult>>,
    pub observers: Observers,
    pub feedback: Feedback,
    /// Set by the first confirmation of a start cycle, suppressed or not;
    /// disarms the timeout.
    pub confirmed: AtomicBool,
}

impl ScanContext {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            debouncer: Mutex::new(DetectionDebouncer::new(
                config.success_tolerance,
                config.duplicate_window_ms,
            )),
            history: Mutex::new(ScanHistory::new(config.history_max_size)),
            last_found: Mutex::new(None),
            observers: Observers::default(),
            feedback: Feedback::new(),
            confirmed: AtomicBool::new(false),
        }
    }

    pub fn begin_cycle(&self, config: &SessionConfig) {
        let mut debouncer = lock(&self.debouncer);
        debouncer.reconfigure(config.success_tolerance, config.duplicate_window_ms);
        debouncer.reset_streak();
        self.confirmed.store(false, Ordering::SeqCst);
    }

    fn record(&self, result: &DetectionResult) {
        lock(&self.history).add(ScanHistoryEntry::from(result));
        *lock(&self.last_found) = Some(result.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The source had no frame ready.
    NoFrame,
    /// Decoder boundary failed; frame abandoned.
    DecodeFailed,
    Miss,
    Pending,
    Suppressed,
    Confirmed(DetectionResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    /// A confirmation arrived with auto-stop enabled.
    AutoStop,
}

/// Decode one frame and lift the raw hit into a classified, full-frame result.
pub(crate) fn detect_in_frame(
    decoder: &dyn QrDecoder,
    frame: &Frame,
    region: ScanRegion,
    inversion: InversionMode,
    source: DetectionSource,
) -> Result<Option<DetectionResult>, DecodeError> {
    let (view, offset) = frame.region(region);
    let options = DecodeOptions { inversion };

    let Some(raw) = decoder.decode(&view.pixels, view.width, view.height, &options)? else {
        return Ok(None);
    };

    let content_type = classify(&raw.payload);
    Ok(Some(DetectionResult {
        location: Some(raw.quad.translated(offset)),
        payload: raw.payload,
        timestamp_ms: Utc::now().timestamp_millis(),
        content_type,
        source_region_offset: offset,
        format: QR_CODE_FORMAT.to_string(),
        source,
    }))
}

pub struct ScanLoop {
    source: Arc<dyn FrameSource>,
    decoder: Arc<dyn QrDecoder>,
    config: Arc<SessionConfig>,
    context: Arc<ScanContext>,
}

impl ScanLoop {
    pub(crate) fn new(
        source: Arc<dyn FrameSource>,
        decoder: Arc<dyn QrDecoder>,
        config: Arc<SessionConfig>,
        context: Arc<ScanContext>,
    ) -> Self {
        Self {
            source,
            decoder,
            config,
            context,
        }
    }

    pub fn tick(&self) -> TickOutcome {
        let Some(frame) = self.source.current_frame() else {
            return TickOutcome::NoFrame;
        };

        let detection = match detect_in_frame(
            self.decoder.as_ref(),
            &frame,
            self.config.scan_region,
            self.config.inversion,
            DetectionSource::Camera,
        ) {
            Ok(detection) => detection,
            Err(err) => {
                log_warn!("abandoning frame {}x{}: {err}", frame.width, frame.height);
                return TickOutcome::DecodeFailed;
            }
        };

        let verdict = lock(&self.context.debouncer).observe(detection.as_ref());
        let Some(result) = detection else {
            return TickOutcome::Miss;
        };

        match verdict {
            Verdict::Pending => TickOutcome::Pending,
            Verdict::Suppressed => {
                log_debug!("suppressed repeat of {:?}", result.payload);
                self.context.record(&result);
                self.context.confirmed.store(true, Ordering::SeqCst);
                TickOutcome::Suppressed
            }
            Verdict::Confirmed => {
                log_info!("confirmed {} code: {:?}", result.content_type, result.payload);
                self.context.record(&result);
                self.context.confirmed.store(true, Ordering::SeqCst);
                self.context.observers.notify_found(&result);
                self.context
                    .feedback
                    .signal_success(self.config.beep_on_success, self.config.vibrate);
                TickOutcome::Confirmed(result)
            }
        }
    }

    /// Tick, then sleep `scan_interval` measured from the end of the tick, until
    /// cancelled. The token is checked fresh at every loop entry.
    pub async fn run(self, cancel_token: CancellationToken) -> LoopExit {
        let interval = Duration::from_millis(self.config.scan_interval_ms);

        loop {
            if cancel_token.is_cancelled() {
                return LoopExit::Cancelled;
            }

            let outcome = self.tick();
            if matches!(outcome, TickOutcome::Confirmed(_)) && self.config.auto_stop {
                log_info!("auto-stop after confirmed detection");
                return LoopExit::AutoStop;
            }

            tokio::select! {
                _ = cancel_token.cancelled() => {
                    log_debug!("scan loop shutting down");
                    return LoopExit::Cancelled;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
