//! Shared types for the analysis pipeline

use crate::ai::GatewayError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use super::vision::PayloadError;

/// What kind of content a file holds
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Human-readable text, summarized
    Text,
    /// Supported image type, described
    Image,
    /// Neither; reported as unsupported
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Unknown => "unknown",
        }
    }
}

/// Pipeline progress for a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Classified,
    PayloadReady,
    GatewayInvoked,
    Succeeded,
}

/// Output of a successful analysis.
///
/// Serializes as the `{"filename", "description"}` envelope printed by `--json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisResult {
    /// Absolute path of the analyzed file
    #[serde(rename = "filename")]
    pub source_path: String,

    /// Summary for text, description for images
    #[serde(rename = "description")]
    pub summary_or_description: String,
}

/// Reasons a file analysis ends in failure
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: '{}' is of type '{mime}'", .path.display())]
    UnsupportedType { path: PathBuf, mime: String },

    #[error("failed to process image {}: {source}", .path.display())]
    ImageProcessing {
        path: PathBuf,
        #[source]
        source: PayloadError,
    },

    #[error("API key not set; export OPENAI_API_KEY or pass --api-key")]
    MissingCredential,

    #[error("{} is too large to summarize (~{tokens} tokens, limit {limit})", .path.display())]
    TooLarge {
        path: PathBuf,
        tokens: usize,
        limit: usize,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
