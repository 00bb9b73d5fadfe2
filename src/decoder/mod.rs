//! The pixel-level QR decoder boundary.

mod rqrr_decoder;

pub use rqrr_decoder::RqrrDecoder;

use crate::config::InversionMode;
use crate::error::DecodeError;
use crate::models::RawDetection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub inversion: InversionMode,
}

pub trait QrDecoder: Send + Sync {
    /// Look for one code in a tightly packed RGBA8 buffer.
    ///
    /// Empty or malformed buffers yield `Ok(None)`; `Err` is reserved for the
    /// decoder itself breaking.
    fn decode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Result<Option<RawDetection>, DecodeError>;
}
