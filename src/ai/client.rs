//! Chat completions gateway
//!
//! [`Gateway`] is the contract the dispatcher talks to; [`OpenAiClient`] is
//! the HTTP transport for any OpenAI-compatible `/v1/chat/completions`
//! endpoint. Response decoding lives in [`decode_completion`] so it can be
//! exercised without a network.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_client;
use super::types::{AnalysisRequest, GatewayError};

/// Default API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Submit a conversation, receive the completion text.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn invoke(&self, api_key: &str, request: &AnalysisRequest)
        -> Result<String, GatewayError>;
}

/// HTTP transport for OpenAI-compatible chat completions
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
}

impl OpenAiClient {
    /// Create a client for `base_url` with the given request timeout
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = http_client::client_for_timeout(timeout_secs)
            .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), COMPLETIONS_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Gateway for OpenAiClient {
    async fn invoke(
        &self,
        api_key: &str,
        request: &AnalysisRequest,
    ) -> Result<String, GatewayError> {
        tracing::debug!(
            "[OpenAiClient] Sending {} message(s) to model {}",
            request.messages().len(),
            request.model()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(format!("Failed to read response body: {}", e)))?;

        tracing::debug!("[OpenAiClient] Got response with status: {}", status);

        if !status.is_success() {
            tracing::warn!("[OpenAiClient] API error ({})", status);
            return match decode_completion(&body) {
                Err(reported @ GatewayError::ApiReported(_)) => Err(reported),
                _ => Err(GatewayError::Transport(format!("HTTP {}: {}", status, body))),
            };
        }

        decode_completion(&body)
    }
}

// Response types

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Option<serde_json::Value>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Detailed {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
    Plain(String),
}

impl ApiErrorBody {
    fn into_message(self) -> String {
        match self {
            Self::Detailed {
                message: Some(message),
                ..
            } => message,
            Self::Detailed {
                message: None,
                kind: Some(kind),
            } => kind,
            Self::Detailed { .. } => "unknown error".to_string(),
            Self::Plain(message) => message,
        }
    }
}

/// Accepted shapes of `choices[0]`, tried top to bottom
#[derive(Deserialize)]
#[serde(untagged)]
enum ChoiceShape {
    /// `{"message": {"content": "..."}}`
    Chat { message: ChatMessage },
    /// `{"text": "..."}` from the legacy completions API
    Completion { text: String },
}

#[derive(Deserialize)]
struct ChatMessage {
    /// Outer `None` when the key is absent, inner `None` when it is `null`
    #[serde(default, deserialize_with = "present")]
    content: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ChoiceShape {
    fn into_content(self) -> Result<Option<String>, GatewayError> {
        match self {
            Self::Chat { message } => message
                .content
                .ok_or_else(|| GatewayError::Decode("content missing from message".to_string())),
            Self::Completion { text } => Ok(Some(text)),
        }
    }
}

/// Extract the completion text from a response body.
///
/// An `error` object wins over any `choices`, whatever their shape. Missing
/// or empty `choices`, and null or blank content, are
/// [`GatewayError::EmptyResponse`]. Anything that is not one of the known
/// shapes, including a message without a `content` key, is
/// [`GatewayError::Decode`].
pub fn decode_completion(body: &str) -> Result<String, GatewayError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::Decode(format!("invalid response JSON: {}", e)))?;

    if let Some(error) = response.error {
        return Err(GatewayError::ApiReported(error.into_message()));
    }

    let first = match response.choices {
        None | Some(serde_json::Value::Null) => return Err(GatewayError::EmptyResponse),
        Some(serde_json::Value::Array(choices)) => choices
            .into_iter()
            .next()
            .ok_or(GatewayError::EmptyResponse)?,
        Some(_) => return Err(GatewayError::Decode("choices is not an array".to_string())),
    };

    let shape: ChoiceShape = serde_json::from_value(first)
        .map_err(|_| GatewayError::Decode("unrecognized format for first choice".to_string()))?;

    match shape.into_content()? {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(GatewayError::EmptyResponse),
    }
}
