use std::sync::{Arc, Mutex};

use crate::error::ScanError;
use crate::models::DetectionResult;
use crate::utils::lock;

pub type FoundCallback = Arc<dyn Fn(&DetectionResult) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&ScanError) + Send + Sync>;

/// Registered "found" and "error" observers.
///
/// Callbacks run outside the registry lock, so they may call back into the
/// controller (including registering more observers).
#[derive(Default)]
pub struct Observers {
    found: Mutex<Vec<FoundCallback>>,
    error: Mutex<Vec<ErrorCallback>>,
}

impl Observers {
    pub fn on_found(&self, callback: FoundCallback) {
        lock(&self.found).push(callback);
    }

    pub fn on_error(&self, callback: ErrorCallback) {
        lock(&self.error).push(callback);
    }

    pub fn notify_found(&self, result: &DetectionResult) {
        let callbacks = lock(&self.found).clone();
        for callback in callbacks {
            callback(result);
        }
    }

    pub fn notify_error(&self, error: &ScanError) {
        let callbacks = lock(&self.error).clone();
        for callback in callbacks {
            callback(error);
        }
    }
}
