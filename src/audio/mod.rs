//! Success feedback: an audio cue and an optional vibration pulse.

#[cfg(feature = "audio")]
mod engine;
#[cfg(feature = "audio")]
mod tone;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::debug;

use crate::utils::lock;

const BEEP_FREQUENCY_HZ: f32 = 1760.0;
const BEEP_DURATION: Duration = Duration::from_millis(120);
const VIBRATION: Duration = Duration::from_millis(200);

/// A haptic device. Returns `false` when the device cannot vibrate right now.
pub trait Vibrator: Send + Sync {
    fn vibrate(&self, duration: Duration) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackOutcome {
    pub beeped: bool,
    pub vibrated: bool,
}

pub struct Feedback {
    #[cfg(feature = "audio")]
    beeper: engine::BeepEngineHandle,
    vibrator: Mutex<Option<Arc<dyn Vibrator>>>,
}

impl Default for Feedback {
    fn default() -> Self {
        Self::new()
    }
}

impl Feedback {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "audio")]
            beeper: engine::BeepEngineHandle::new(),
            vibrator: Mutex::new(None),
        }
    }

    pub fn set_vibrator(&self, vibrator: Option<Arc<dyn Vibrator>>) {
        *lock(&self.vibrator) = vibrator;
    }

    /// Fire whichever cues are enabled, skipping any that are unavailable.
    pub fn signal_success(&self, beep: bool, vibrate: bool) -> FeedbackOutcome {
        FeedbackOutcome {
            beeped: beep && self.play_beep(),
            vibrated: vibrate && self.pulse(),
        }
    }

    #[cfg(feature = "audio")]
    fn play_beep(&self) -> bool {
        match self.beeper.beep(BEEP_FREQUENCY_HZ, BEEP_DURATION) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("could not queue audio cue: {err}");
                false
            }
        }
    }

    #[cfg(not(feature = "audio"))]
    fn play_beep(&self) -> bool {
        debug!(
            "audio cue ({BEEP_FREQUENCY_HZ} Hz, {:?}) unavailable: built without the `audio` feature",
            BEEP_DURATION
        );
        false
    }

    fn pulse(&self) -> bool {
        let vibrator = lock(&self.vibrator).clone();
        match vibrator {
            Some(vibrator) => {
                let ok = vibrator.vibrate(VIBRATION);
                if !ok {
                    debug!("vibrator reported unavailable");
                }
                ok
            }
            None => {
                debug!("no vibrator installed");
                false
            }
        }
    }
}
