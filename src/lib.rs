pub mod ai;
pub mod analysis;
pub mod config;

pub use analysis::{AnalysisResult, AnalyzeError, Dispatcher, Verdict};
pub use config::AppConfig;

use tracing_subscriber::EnvFilter;

/// Load `.env` and install the stderr tracing subscriber.
///
/// Stdout is reserved for results.
pub fn init() {
    // Load .env file - try the working directory, then the user config dir
    if dotenvy::dotenv().is_err() {
        if let Some(path) = dirs::config_dir().map(|dir| dir.join("fileai").join(".env")) {
            let _ = dotenvy::from_path(path);
        }
    }

    // Initialize tracing with RUST_LOG env filter
    // Default: warn for most crates, info for our app
    // Use RUST_LOG=debug for verbose per-stage logs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,fileai=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
