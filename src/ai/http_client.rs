//! Shared HTTP Client Module
//!
//! Provides a lazily-initialized HTTP client for the completions API so the
//! default configuration reuses one connection pool, plus a builder for
//! callers that need a different timeout.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Timeout used by the shared client
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Global HTTP client for OpenAI-compatible API calls
///
/// Falls back to a default client if the tuned builder fails (e.g. TLS
/// backend initialization), which only loses the tuning.
static OPENAI_CLIENT: Lazy<Client> = Lazy::new(|| {
    build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)).unwrap_or_else(|e| {
        tracing::warn!("Failed to build tuned HTTP client: {}. Using defaults.", e);
        Client::new()
    })
});

/// Get the global OpenAI HTTP client
#[inline]
pub fn openai_client() -> &'static Client {
    &OPENAI_CLIENT
}

/// Build a client with the given request timeout
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
}

/// Client for a configured timeout, sharing the global one when it matches
pub fn client_for_timeout(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    if timeout_secs == DEFAULT_TIMEOUT_SECS {
        Ok(openai_client().clone())
    } else {
        build_client(Duration::from_secs(timeout_secs))
    }
}
