use crate::models::DetectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not enough consecutive hits yet (or nothing seen this frame).
    Pending,
    /// A fresh confirmation: report it.
    Confirmed,
    /// Same payload confirmed again inside the duplicate window.
    Suppressed,
}

#[derive(Debug, Clone)]
struct LastConfirmed {
    payload: String,
    timestamp_ms: i64,
}

/// Turns a noisy per-frame detection stream into confirmation events.
#[derive(Debug, Clone)]
pub struct DetectionDebouncer {
    success_tolerance: u32,
    duplicate_window_ms: u64,
    consecutive: u32,
    last_confirmed: Option<LastConfirmed>,
}

impl DetectionDebouncer {
    pub fn new(success_tolerance: u32, duplicate_window_ms: u64) -> Self {
        Self {
            success_tolerance,
            duplicate_window_ms,
            consecutive: 0,
            last_confirmed: None,
        }
    }

    pub fn observe(&mut self, result: Option<&DetectionResult>) -> Verdict {
        let Some(result) = result else {
            self.consecutive = 0;
            return Verdict::Pending;
        };

        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive < self.success_tolerance {
            return Verdict::Pending;
        }

        let duplicate = self.last_confirmed.as_ref().is_some_and(|last| {
            last.payload == result.payload
                && result.timestamp_ms.saturating_sub(last.timestamp_ms)
                    < self.duplicate_window_ms as i64
        });

        self.last_confirmed = Some(LastConfirmed {
            payload: result.payload.clone(),
            timestamp_ms: result.timestamp_ms,
        });

        if duplicate {
            Verdict::Suppressed
        } else {
            Verdict::Confirmed
        }
    }

    pub fn consecutive_hits(&self) -> u32 {
        self.consecutive
    }

    /// Drop the streak but keep the last confirmation, so a restart does not
    /// immediately re-fire for a code still in view.
    pub fn reset_streak(&mut self) {
        self.consecutive = 0;
    }

    pub fn reconfigure(&mut self, success_tolerance: u32, duplicate_window_ms: u64) {
        self.success_tolerance = success_tolerance;
        self.duplicate_window_ms = duplicate_window_ms;
    }
}
