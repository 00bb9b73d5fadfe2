pub mod detection;
pub mod history_entry;

pub use detection::{
    ContentType, DetectionResult, DetectionSource, Point, Quad, RawDetection, RegionOffset,
    QR_CODE_FORMAT,
};
pub use history_entry::ScanHistoryEntry;
