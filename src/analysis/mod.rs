//! File Analysis Pipeline
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  1. READ: whole file into memory                            │
//! │  2. CLASSIFY: printable-byte ratio, then image extension    │
//! │  3. PREPARE: text as-is, images -> 800px JPEG -> base64     │
//! │  4. INVOKE: one chat completion through the Gateway         │
//! │  5. RESULT: {filename, description}                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod dispatcher;
pub mod types;
pub mod vision;

pub use classifier::classify;
pub use dispatcher::Dispatcher;
pub use types::{AnalysisResult, AnalyzeError, Stage, Verdict};
pub use vision::PayloadError;
