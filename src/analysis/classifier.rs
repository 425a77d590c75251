//! Content classification
//!
//! Decides whether a file should be summarized as text, described as an
//! image, or rejected. Only the first [`SAMPLE_SIZE`] bytes and the file
//! extension are ever looked at.

use super::types::Verdict;
use std::path::Path;

/// Number of leading bytes sampled for text detection
pub const SAMPLE_SIZE: usize = 512;

/// Extensions routed to image description
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff"];

/// Classify file content. Text wins over image; empty content is always unknown.
pub fn classify(content: &[u8], path: &Path) -> Verdict {
    if content.is_empty() {
        return Verdict::Unknown;
    }

    if is_likely_text(content) {
        return Verdict::Text;
    }

    if is_image_path(path) {
        cross_check_image(content, path);
        return Verdict::Image;
    }

    Verdict::Unknown
}

/// True when at least 90% of the sampled bytes are printable ASCII or `\n`, `\r`, `\t`.
pub fn is_likely_text(content: &[u8]) -> bool {
    let sample = &content[..content.len().min(SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }

    let text_count = sample.iter().filter(|&&b| is_text_byte(b)).count();

    // text_count / len >= 0.9 without floating point
    text_count * 10 >= sample.len() * 9
}

fn is_text_byte(b: u8) -> bool {
    matches!(b, b'\n' | b'\r' | b'\t' | b' '..=b'~')
}

/// Check if a path's extension is an image type we can describe
pub fn is_image_path(path: &Path) -> bool {
    is_image_extension(path.extension().and_then(|e| e.to_str()))
}

/// Case-insensitive match against the supported image extensions
pub fn is_image_extension(ext: Option<&str>) -> bool {
    match ext {
        Some(e) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(e)),
        None => false,
    }
}

/// Best-effort MIME type for a file we could not route
pub fn describe_unknown(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Log when magic bytes disagree with an image extension. Never changes the verdict.
fn cross_check_image(content: &[u8], path: &Path) {
    match image::guess_format(content) {
        Ok(format) => {
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| {
                    format
                        .extensions_str()
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                });
            if !matches_ext {
                tracing::warn!(
                    "[Classifier] {} looks like {:?} despite its extension",
                    path.display(),
                    format
                );
            }
        }
        Err(_) => {
            tracing::warn!(
                "[Classifier] {} has an image extension but unrecognized content",
                path.display()
            );
        }
    }
}
