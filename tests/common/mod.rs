//! In-memory camera and decoder doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use qrscan_lib::capture::{
    Frame, FrameSize, MediaDevices, VideoConstraints, VideoInputDevice, VideoStream, VideoTrack,
};
use qrscan_lib::decoder::{DecodeOptions, QrDecoder};
use qrscan_lib::models::{Point, Quad, RawDetection};
use qrscan_lib::{DecodeError, DetectionResult, MediaError, ScanError};
use tokio::sync::Notify;

pub const FRAME_SIZE: FrameSize = FrameSize {
    width: 64,
    height: 48,
};

pub struct FakeTrack {
    id: String,
    torch_capable: bool,
    torch: AtomicBool,
    stopped: AtomicBool,
}

impl FakeTrack {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoTrack for FakeTrack {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn torch_capable(&self) -> bool {
        self.torch_capable
    }

    fn torch_enabled(&self) -> bool {
        self.torch.load(Ordering::SeqCst)
    }

    async fn set_torch(&self, on: bool) -> Result<(), MediaError> {
        self.torch.store(on, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeStream {
    track: Arc<FakeTrack>,
    fail_ready: bool,
}

#[async_trait]
impl VideoStream for FakeStream {
    async fn ready(&self) -> Result<FrameSize, MediaError> {
        if self.fail_ready {
            return Err(MediaError::Other("stream ended before first frame".into()));
        }
        Ok(FRAME_SIZE)
    }

    fn tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        vec![self.track.clone()]
    }

    fn grab_frame(&self) -> Option<Frame> {
        let (w, h) = (FRAME_SIZE.width, FRAME_SIZE.height);
        Some(Frame::new(w, h, vec![128; (w * h * 4) as usize]))
    }
}

pub struct FakeMediaDevices {
    cameras: usize,
    torch_capable: bool,
    fail_ready: bool,
    deny: AtomicBool,
    gate: Option<Notify>,
    requests: Mutex<Vec<VideoConstraints>>,
    tracks: Mutex<Vec<Arc<FakeTrack>>>,
}

impl FakeMediaDevices {
    pub fn new(cameras: usize) -> Self {
        Self {
            cameras,
            torch_capable: false,
            fail_ready: false,
            deny: AtomicBool::new(false),
            gate: None,
            requests: Mutex::new(Vec::new()),
            tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_torch(mut self) -> Self {
        self.torch_capable = true;
        self
    }

    /// Streams are handed out but never become ready.
    pub fn failing_ready(mut self) -> Self {
        self.fail_ready = true;
        self
    }

    /// Acquisition blocks until `open_gate` is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_permission_denied(&self, denied: bool) {
        self.deny.store(denied, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<VideoConstraints> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tracks(&self) -> Vec<Arc<FakeTrack>> {
        self.tracks.lock().unwrap().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks().iter().filter(|track| !track.is_stopped()).count()
    }
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn acquire_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, MediaError> {
        self.requests.lock().unwrap().push(constraints.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.deny.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied);
        }

        let track = {
            let mut tracks = self.tracks.lock().unwrap();
            let track = Arc::new(FakeTrack {
                id: format!("track-{}", tracks.len()),
                torch_capable: self.torch_capable,
                torch: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
            });
            tracks.push(track.clone());
            track
        };

        Ok(Box::new(FakeStream {
            track,
            fail_ready: self.fail_ready,
        }))
    }

    async fn enumerate_video_inputs(&self) -> Result<Vec<VideoInputDevice>, MediaError> {
        Ok((0..self.cameras)
            .map(|n| VideoInputDevice {
                device_id: format!("cam-{n}"),
                label: format!("Camera {n}"),
            })
            .collect())
    }
}

/// Decoder that reports whatever payload the test sets, on every frame.
#[derive(Default)]
pub struct ScriptedDecoder {
    payload: Mutex<Option<String>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn finding(payload: &str) -> Self {
        let decoder = Self::default();
        decoder.set_payload(Some(payload));
        decoder
    }

    pub fn set_payload(&self, payload: Option<&str>) {
        *self.payload.lock().unwrap() = payload.map(str::to_string);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QrDecoder for ScriptedDecoder {
    fn decode(
        &self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
        _options: &DecodeOptions,
    ) -> Result<Option<RawDetection>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DecodeError("scripted failure".into()));
        }
        Ok(self.payload.lock().unwrap().clone().map(|payload| RawDetection {
            payload,
            quad: Quad {
                top_left: Point::new(2.0, 2.0),
                top_right: Point::new(10.0, 2.0),
                bottom_right: Point::new(10.0, 10.0),
                bottom_left: Point::new(2.0, 10.0),
            },
        }))
    }
}

/// Collects everything delivered to `on_found` / `on_error`.
#[derive(Clone, Default)]
pub struct Recorder {
    pub found: Arc<Mutex<Vec<DetectionResult>>>,
    pub errors: Arc<Mutex<Vec<ScanError>>>,
}

impl Recorder {
    pub fn attach(controller: &qrscan_lib::ScanSessionController) -> Self {
        let recorder = Self::default();
        let found = recorder.found.clone();
        controller.on_found(move |result| found.lock().unwrap().push(result.clone()));
        let errors = recorder.errors.clone();
        controller.on_error(move |err| errors.lock().unwrap().push(err.clone()));
        recorder
    }

    pub fn found(&self) -> Vec<DetectionResult> {
        self.found.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<ScanError> {
        self.errors.lock().unwrap().clone()
    }
}
