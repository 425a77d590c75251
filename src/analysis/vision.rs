//! Payload preparation
//!
//! Images are normalized before they are sent: resized to a fixed width,
//! re-encoded as JPEG and base64-encoded. Text passes through unchanged.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};
use thiserror::Error;

/// Width every image is resized to
pub const TARGET_WIDTH: u32 = 800;

/// JPEG quality for the re-encoded image
pub const JPEG_QUALITY: u8 = 80;

/// Failures while turning an image file into a payload
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] ImageError),

    #[error("image of {width}x{height} would be {target_height} px tall after resizing, above the JPEG limit of 65535")]
    TooLarge {
        width: u32,
        height: u32,
        target_height: u32,
    },
}

/// Largest side length a JPEG can encode
const MAX_JPEG_SIDE: u32 = u16::MAX as u32;

/// Text payload: the content as-is, with invalid UTF-8 replaced
pub fn prepare_text(content: &[u8]) -> String {
    String::from_utf8_lossy(content).into_owned()
}

/// Decode, resize to [`TARGET_WIDTH`], re-encode as JPEG and base64-encode
pub fn prepare_image(image_data: &[u8]) -> Result<String, PayloadError> {
    let img = image::load_from_memory(image_data).map_err(PayloadError::Decode)?;

    // Must run before the resize allocates the target buffer
    let (width, height) = (img.width(), img.height());
    let new_height = target_height(width, height);
    if new_height > MAX_JPEG_SIDE {
        return Err(PayloadError::TooLarge {
            width,
            height,
            target_height: new_height,
        });
    }

    let img = resize_to_target(img, new_height);

    // JPEG has no alpha channel
    let rgb = img.to_rgb8();

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(PayloadError::Encode)?;

    tracing::debug!(
        "[Vision] Normalized image to {}x{} ({} bytes JPEG)",
        rgb.width(),
        rgb.height(),
        buffer.len()
    );

    Ok(STANDARD.encode(&buffer))
}

/// Wrap a prepared payload as a data URL for the vision API
pub fn image_data_url(payload: &str) -> String {
    format!("data:image/jpeg;base64,{}", payload)
}

/// Target height for a [`TARGET_WIDTH`]-wide image with the same aspect ratio
fn target_height(width: u32, height: u32) -> u32 {
    let scaled = (height as f64 * TARGET_WIDTH as f64 / width as f64).round() as u32;
    scaled.max(1)
}

fn resize_to_target(img: DynamicImage, target_height: u32) -> DynamicImage {
    if img.width() == TARGET_WIDTH {
        return img;
    }

    img.resize_exact(TARGET_WIDTH, target_height, FilterType::Lanczos3)
}

/// Rough token count: separators and punctuation, plus one
pub fn estimate_tokens(text: &str) -> usize {
    text.bytes()
        .filter(|&b| matches!(b, b' ' | b'.' | b',' | b';' | b':'))
        .count()
        + 1
}
