//! Loading single images for one-shot scans.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use log::debug;

use crate::error::ScanError;

/// Decode in-memory bytes into an image, off the async runtime.
pub async fn load_image_bytes(bytes: Vec<u8>) -> Result<DynamicImage, ScanError> {
    let format = image::guess_format(&bytes)
        .map_err(|_| ScanError::NotAnImage("unrecognised image signature".to_string()))?;
    debug!("decoding {} byte {format:?} image", bytes.len());

    tokio::task::spawn_blocking(move || image::load_from_memory_with_format(&bytes, format))
        .await
        .map_err(|err| ScanError::ImageLoad(format!("decode task failed: {err}")))?
        .map_err(|err| ScanError::ImageLoad(err.to_string()))
}

pub async fn load_image_file(path: &Path) -> Result<DynamicImage, ScanError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ScanError::ImageLoad(format!("{}: {err}", path.display())))?;
    load_image_bytes(bytes).await
}

/// Accepts `data:` URLs, `file://` URLs and plain filesystem paths.
pub async fn load_image_url(url: &str) -> Result<DynamicImage, ScanError> {
    match ImageLocation::parse(url)? {
        ImageLocation::Inline(bytes) => load_image_bytes(bytes).await,
        ImageLocation::File(path) => load_image_file(&path).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ImageLocation {
    Inline(Vec<u8>),
    File(PathBuf),
}

impl ImageLocation {
    fn parse(url: &str) -> Result<Self, ScanError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScanError::ImageLoad("empty image url".to_string()));
        }

        if let Some(rest) = strip_prefix_ignore_case(url, "data:") {
            return parse_data_url(rest).map(ImageLocation::Inline);
        }
        if let Some(path) = strip_prefix_ignore_case(url, "file://") {
            return Ok(ImageLocation::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(ScanError::unsupported(format!(
                "cannot fetch images over {scheme}://"
            )));
        }

        Ok(ImageLocation::File(PathBuf::from(url)))
    }
}

fn parse_data_url(rest: &str) -> Result<Vec<u8>, ScanError> {
    let (meta, data) = rest
        .split_once(',')
        .ok_or_else(|| ScanError::ImageLoad("data url has no payload".to_string()))?;

    let mut params = meta.split(';');
    let mime = params.next().unwrap_or_default();
    if !mime.is_empty() && !mime.to_ascii_lowercase().starts_with("image/") {
        return Err(ScanError::NotAnImage(format!("data url has type {mime}")));
    }
    if !params.any(|param| param.eq_ignore_ascii_case("base64")) {
        return Err(ScanError::ImageLoad(
            "only base64 data urls are supported".to_string(),
        ));
    }

    STANDARD
        .decode(data.trim())
        .map_err(|err| ScanError::ImageLoad(format!("invalid base64: {err}")))
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
