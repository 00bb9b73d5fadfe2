mod controller;
pub mod debounce;
pub mod events;
pub mod history;
mod loop_worker;
mod state;

pub use controller::ScanSessionController;
pub use debounce::{DetectionDebouncer, Verdict};
pub use history::{ScanHistory, DEFAULT_HISTORY_SIZE};
pub use loop_worker::{LoopExit, ScanLoop, TickOutcome};
pub use state::{ScanState, ScannerSnapshot};
