use serde::{Deserialize, Serialize};

pub const QR_CODE_FORMAT: &str = "QR_CODE";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Corners of a detected code in frame coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    /// Shift every corner from crop coordinates back into full-frame coordinates.
    pub fn translated(self, offset: RegionOffset) -> Self {
        let shift = |p: Point| Point::new(p.x + offset.x as f32, p.y + offset.y as f32);
        Self {
            top_left: shift(self.top_left),
            top_right: shift(self.top_right),
            bottom_right: shift(self.bottom_right),
            bottom_left: shift(self.bottom_left),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegionOffset {
    pub x: u32,
    pub y: u32,
}

impl RegionOffset {
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Url,
    Email,
    Contact,
    Wifi,
    Sms,
    Phone,
    Geo,
    Calendar,
    Json,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Url => "URL",
            ContentType::Email => "EMAIL",
            ContentType::Contact => "CONTACT",
            ContentType::Wifi => "WIFI",
            ContentType::Sms => "SMS",
            ContentType::Phone => "PHONE",
            ContentType::Geo => "GEO",
            ContentType::Calendar => "CALENDAR",
            ContentType::Json => "JSON",
            ContentType::Text => "TEXT",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DetectionSource {
    Camera,
    StaticImage,
    Manual,
}

/// What the decoder hands back for one frame, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub payload: String,
    pub quad: Quad,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub payload: String,
    /// Full-frame coordinates; absent for manual entries.
    pub location: Option<Quad>,
    pub timestamp_ms: i64,
    pub content_type: ContentType,
    pub source_region_offset: RegionOffset,
    pub format: String,
    pub source: DetectionSource,
}

impl DetectionResult {
    pub fn is_manual_entry(&self) -> bool {
        self.source == DetectionSource::Manual
    }
}
