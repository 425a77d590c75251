//! Request and error types for the chat completions gateway

use serde::Serialize;
use thiserror::Error;

/// Errors from a gateway invocation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// Connection, timeout or body read failure
    #[error("request to AI service failed: {0}")]
    Transport(String),

    /// Response body did not have the expected structure
    #[error("failed to decode AI service response: {0}")]
    Decode(String),

    /// The service answered with an explicit error object
    #[error("AI service error: {0}")]
    ApiReported(String),

    /// The service answered without any usable completion
    #[error("no response from AI service")]
    EmptyResponse,
}

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a multi-part message (vision requests)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrlContent },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrlContent {
    pub url: String,
}

/// Message body: a plain string, or ordered parts for image input
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single role-tagged message in a conversation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ConversationMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying a text prompt followed by an image URL
    pub fn user_with_image(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.into(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrlContent {
                        url: image_url.into(),
                    },
                },
            ]),
        }
    }

    /// Plain text of this message, if it has any
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }
}

/// Chat completion request body.
///
/// Always holds at least one message: it can only be built from a first
/// message and grown with [`AnalysisRequest::with_message`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisRequest {
    model: String,
    messages: Vec<ConversationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl AnalysisRequest {
    pub fn new(model: impl Into<String>, first: ConversationMessage) -> Self {
        Self {
            model: model.into(),
            messages: vec![first],
            max_tokens: None,
        }
    }

    /// Single-string style: one user message of `prompt`, a blank line, then `input`
    pub fn from_prompt(model: impl Into<String>, prompt: &str, input: &str) -> Self {
        Self::new(
            model,
            ConversationMessage::user(super::prompts::compose(prompt, input)),
        )
    }

    pub fn with_message(mut self, message: ConversationMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }
}
