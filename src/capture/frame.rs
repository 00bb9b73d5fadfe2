use std::borrow::Cow;

use image::DynamicImage;

use crate::config::ScanRegion;
use crate::models::RegionOffset;

/// A single RGBA8 frame, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Cut out the configured scan region. The returned offset maps crop
    /// coordinates back into this frame.
    pub fn region(&self, region: ScanRegion) -> (Cow<'_, Frame>, RegionOffset) {
        let full = (Cow::Borrowed(self), RegionOffset::default());
        if region == ScanRegion::Full {
            return full;
        }

        let (x, y) = (self.width / 4, self.height / 4);
        let (width, height) = (self.width / 2, self.height / 2);
        if width == 0 || height == 0 {
            return full;
        }

        let (stride, row_len) = (self.width as usize * 4, width as usize * 4);
        let needed = stride.checked_mul(self.height as usize);
        if needed.map_or(true, |needed| self.pixels.len() < needed) {
            return full;
        }

        let mut cropped = Vec::with_capacity(row_len * height as usize);
        for row in y..y + height {
            let start = row as usize * stride + x as usize * 4;
            cropped.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        (
            Cow::Owned(Frame::new(width, height, cropped)),
            RegionOffset { x, y },
        )
    }
}

/// Anything the scan loop can sample frames from.
pub trait FrameSource: Send + Sync {
    fn current_frame(&self) -> Option<Frame>;
}

/// Serves the same still image on every sample.
pub struct StillFrameSource {
    frame: Frame,
}

impl StillFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }
}

impl FrameSource for StillFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        Some(self.frame.clone())
    }
}
