use std::panic::{self, AssertUnwindSafe};

use rqrr::PreparedImage;

use crate::config::InversionMode;
use crate::error::DecodeError;
use crate::models::{Point, Quad, RawDetection};

use super::{DecodeOptions, QrDecoder};

/// [`QrDecoder`] backed by the pure-Rust `rqrr` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Result<Option<RawDetection>, DecodeError> {
        let (w, h) = (width as usize, height as usize);
        let Some(len) = w.checked_mul(h).and_then(|n| n.checked_mul(4)) else {
            return Ok(None);
        };
        if len == 0 || pixels.len() < len {
            return Ok(None);
        }

        let luma = to_luma(&pixels[..len]);
        let passes: &[bool] = match options.inversion {
            InversionMode::DontInvert => &[false],
            InversionMode::OnlyInvert => &[true],
            InversionMode::AttemptBoth => &[false, true],
            InversionMode::InvertFirst => &[true, false],
        };

        for &inverted in passes {
            let found = panic::catch_unwind(AssertUnwindSafe(|| scan_luma(&luma, w, h, inverted)))
                .map_err(|_| DecodeError("rqrr panicked while scanning frame".into()))?;
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

/// Integer BT.601-ish weights; alpha is ignored.
fn to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| ((px[0] as u32 * 77 + px[1] as u32 * 150 + px[2] as u32 * 29) >> 8) as u8)
        .collect()
}

fn scan_luma(luma: &[u8], width: usize, height: usize, inverted: bool) -> Option<RawDetection> {
    let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| {
        let value = luma[y * width + x];
        if inverted {
            255 - value
        } else {
            value
        }
    });

    prepared.detect_grids().into_iter().find_map(|grid| {
        let (_meta, payload) = grid.decode().ok()?;
        // rqrr reports corners clockwise from top-left.
        let [tl, tr, br, bl] = grid.bounds;
        Some(RawDetection {
            payload,
            quad: Quad {
                top_left: Point::new(tl.x as f32, tl.y as f32),
                top_right: Point::new(tr.x as f32, tr.y as f32),
                bottom_right: Point::new(br.x as f32, br.y as f32),
                bottom_left: Point::new(bl.x as f32, bl.y as f32),
            },
        })
    })
}
