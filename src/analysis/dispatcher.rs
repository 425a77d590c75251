//! Dispatcher
//!
//! Drives one file through the pipeline:
//!
//! ```text
//! Start -> Classified -> PayloadReady -> GatewayInvoked -> Succeeded
//!    \          \              \               \
//!     +----------+--------------+---------------+--> Failed(AnalyzeError)
//! ```
//!
//! Every step is sequential and nothing is retried. The only suspension
//! point is the gateway call.

use super::classifier::{classify, describe_unknown};
use super::types::{AnalysisResult, AnalyzeError, Stage, Verdict};
use super::vision::{estimate_tokens, image_data_url, prepare_image, prepare_text};
use crate::ai::prompts::compose;
use crate::ai::{AnalysisRequest, ConversationMessage, Gateway};
use crate::config::AppConfig;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Routes classified content to the gateway with the configured prompts and models
pub struct Dispatcher<G> {
    config: AppConfig,
    gateway: G,
}

impl<G: Gateway> Dispatcher<G> {
    pub fn new(config: AppConfig, gateway: G) -> Self {
        Self { config, gateway }
    }

    /// Read a file from disk and analyze it
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn analyze_file(&self, path: &Path) -> Result<AnalysisResult, AnalyzeError> {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        trace_stage(Stage::Start);

        let content = tokio::fs::read(&path)
            .await
            .map_err(|source| AnalyzeError::Read {
                path: path.clone(),
                source,
            })?;

        self.analyze(&path, &content).await
    }

    /// Analyze content already read from `path`
    pub async fn analyze(
        &self,
        path: &Path,
        content: &[u8],
    ) -> Result<AnalysisResult, AnalyzeError> {
        let verdict = classify(content, path);
        tracing::info!(
            "[Dispatcher] {} classified as {} ({} bytes)",
            path.display(),
            verdict.as_str(),
            content.len()
        );
        trace_stage(Stage::Classified);

        let request = self.prepare(path, content, verdict)?;
        trace_stage(Stage::PayloadReady);

        let api_key = self
            .config
            .api_key()
            .ok_or(AnalyzeError::MissingCredential)?;

        let text = self.gateway.invoke(api_key, &request).await?;
        trace_stage(Stage::GatewayInvoked);

        tracing::info!(
            "[Dispatcher] {} analyzed: {} chars returned",
            path.display(),
            text.len()
        );
        trace_stage(Stage::Succeeded);

        Ok(AnalysisResult {
            source_path: path.to_string_lossy().to_string(),
            summary_or_description: text,
        })
    }

    /// Build the gateway request for a classified file
    pub fn prepare(
        &self,
        path: &Path,
        content: &[u8],
        verdict: Verdict,
    ) -> Result<AnalysisRequest, AnalyzeError> {
        match verdict {
            Verdict::Text => self.text_request(path, content),
            Verdict::Image => self.image_request(path, content),
            Verdict::Unknown => Err(AnalyzeError::UnsupportedType {
                path: path.to_path_buf(),
                mime: describe_unknown(path),
            }),
        }
    }

    /// `[system, user]` conversation asking for a summary
    fn text_request(&self, path: &Path, content: &[u8]) -> Result<AnalysisRequest, AnalyzeError> {
        let text = prepare_text(content);

        if let Some(limit) = self.config.max_input_tokens {
            let tokens = estimate_tokens(&text);
            if tokens > limit {
                return Err(AnalyzeError::TooLarge {
                    path: PathBuf::from(path),
                    tokens,
                    limit,
                });
            }
        }

        let user = compose(&self.config.prompts.text.summary, &text);

        Ok(AnalysisRequest::new(
            self.config.models.text.as_str(),
            ConversationMessage::system(self.config.system_prompt.as_str()),
        )
        .with_message(ConversationMessage::user(user)))
    }

    /// Single user message carrying the description prompt and the normalized image
    fn image_request(&self, path: &Path, content: &[u8]) -> Result<AnalysisRequest, AnalyzeError> {
        let payload = prepare_image(content).map_err(|source| AnalyzeError::ImageProcessing {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            "[Dispatcher] Image payload ready: {} base64 chars",
            payload.len()
        );

        Ok(AnalysisRequest::new(
            self.config.models.vision.as_str(),
            ConversationMessage::user_with_image(
                self.config.prompts.image.description.as_str(),
                image_data_url(&payload),
            ),
        )
        .with_max_tokens(self.config.image_max_tokens))
    }
}

fn trace_stage(stage: Stage) {
    tracing::debug!(?stage, "[Dispatcher] stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ContentPart, GatewayError, MessageContent, Role};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every request and answers with a canned result
    struct StubGateway {
        reply: Result<String, GatewayError>,
        calls: Mutex<Vec<(String, AnalysisRequest)>>,
    }

    impl StubGateway {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: GatewayError) -> Self {
            Self {
                reply: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, AnalysisRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Gateway for StubGateway {
        async fn invoke(
            &self,
            api_key: &str,
            request: &AnalysisRequest,
        ) -> Result<String, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push((api_key.to_string(), request.clone()));
            self.reply.clone()
        }
    }

    fn config_with_key() -> AppConfig {
        AppConfig::default().with_api_key(Some("sk-test".to_string()))
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 3 % 256) as u8, (y * 7 % 256) as u8, ((x ^ y) % 256) as u8])
        });
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn binary_noise(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 131 % 97) as u8 | 0x80).collect()
    }

    #[tokio::test]
    async fn test_text_file_is_summarized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let content = b"Meeting notes: ship the release Friday.\n";
        assert_eq!(content.len(), 40);
        std::fs::write(&path, content).unwrap();

        let dispatcher = Dispatcher::new(
            config_with_key(),
            StubGateway::replying("This file contains..."),
        );
        let result = dispatcher.analyze_file(&path).await.unwrap();

        assert_eq!(result.summary_or_description, "This file contains...");
        assert_eq!(result.source_path, path.to_string_lossy());

        let calls = dispatcher.gateway.calls();
        assert_eq!(calls.len(), 1);
        let (api_key, request) = &calls[0];
        assert_eq!(api_key, "sk-test");
        assert_eq!(request.model(), "gpt-4-turbo");

        let messages = request.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].text(), Some("You are a helpful assistant."));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].text(),
            Some("Summarize this content\n\nMeeting notes: ship the release Friday.\n")
        );
    }

    #[tokio::test]
    async fn test_empty_summary_prompt_forwards_content_verbatim() {
        let mut config = config_with_key();
        config.prompts.text.summary = String::new();
        let dispatcher = Dispatcher::new(config, StubGateway::replying("ok"));

        dispatcher
            .analyze(Path::new("a.txt"), b"raw content")
            .await
            .unwrap();

        let (_, request) = &dispatcher.gateway.calls()[0];
        assert_eq!(request.messages()[1].text(), Some("raw content"));
    }

    #[tokio::test]
    async fn test_png_file_is_described_as_jpeg_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diagram.png");
        let png = png_bytes(200, 100);
        std::fs::write(&path, &png).unwrap();

        assert_eq!(classify(&png, &path), Verdict::Image);

        let mut config = config_with_key();
        config.models.vision = "gpt-4o".to_string();
        let dispatcher = Dispatcher::new(config, StubGateway::replying("A colorful gradient."));

        let result = dispatcher.analyze_file(&path).await.unwrap();
        assert_eq!(result.summary_or_description, "A colorful gradient.");

        let (_, request) = &dispatcher.gateway.calls()[0];
        assert_eq!(request.model(), "gpt-4o");
        assert_eq!(request.max_tokens(), Some(300));
        assert_eq!(request.messages().len(), 1);

        let message = &request.messages()[0];
        assert_eq!(message.role, Role::User);
        let MessageContent::Parts(parts) = &message.content else {
            panic!("image request should use content parts");
        };
        assert_eq!(
            parts[0],
            ContentPart::Text {
                text: "What’s in this image?".to_string()
            }
        );
        let ContentPart::ImageUrl { image_url } = &parts[1] else {
            panic!("second part should be the image");
        };

        let payload = image_url
            .url
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        let jpeg = STANDARD.decode(payload).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[tokio::test]
    async fn test_binary_noise_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.xyz");
        std::fs::write(&path, binary_noise(1024)).unwrap();

        let dispatcher = Dispatcher::new(config_with_key(), StubGateway::replying("unused"));
        let result = dispatcher.analyze_file(&path).await;

        assert!(matches!(result, Err(AnalyzeError::UnsupportedType { .. })));
        assert!(dispatcher.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_gateway() {
        let dispatcher = Dispatcher::new(AppConfig::default(), StubGateway::replying("unused"));

        let result = dispatcher
            .analyze(Path::new("notes.txt"), b"some plain text content")
            .await;

        assert!(matches!(result, Err(AnalyzeError::MissingCredential)));
        assert!(dispatcher.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_file_is_read_error() {
        let dir = tempdir().unwrap();
        let dispatcher = Dispatcher::new(config_with_key(), StubGateway::replying("unused"));

        let result = dispatcher.analyze_file(&dir.path().join("missing.txt")).await;

        assert!(matches!(result, Err(AnalyzeError::Read { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_image_is_processing_error() {
        let dispatcher = Dispatcher::new(config_with_key(), StubGateway::replying("unused"));

        let result = dispatcher
            .analyze(Path::new("broken.jpg"), &binary_noise(256))
            .await;

        assert!(matches!(result, Err(AnalyzeError::ImageProcessing { .. })));
        assert!(dispatcher.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_error_is_surfaced() {
        let dispatcher = Dispatcher::new(
            config_with_key(),
            StubGateway::failing(GatewayError::ApiReported("Rate limit reached".to_string())),
        );

        let result = dispatcher.analyze(Path::new("a.md"), b"# Title\n").await;

        match result {
            Err(AnalyzeError::Gateway(GatewayError::ApiReported(message))) => {
                assert_eq!(message, "Rate limit reached")
            }
            other => panic!("expected gateway error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_text_is_rejected() {
        let mut config = config_with_key();
        config.max_input_tokens = Some(5);
        let dispatcher = Dispatcher::new(config, StubGateway::replying("unused"));

        let result = dispatcher
            .analyze(Path::new("long.txt"), b"one two three four five six seven")
            .await;

        assert!(matches!(
            result,
            Err(AnalyzeError::TooLarge {
                tokens: 7,
                limit: 5,
                ..
            })
        ));
        assert!(dispatcher.gateway.calls().is_empty());
    }

    #[test]
    fn test_prepare_unknown_reports_mime() {
        let dispatcher = Dispatcher::new(config_with_key(), StubGateway::replying("unused"));

        let result = dispatcher.prepare(Path::new("archive.zip"), b"PK\x03\x04", Verdict::Unknown);

        match result {
            Err(AnalyzeError::UnsupportedType { mime, .. }) => assert_eq!(mime, "application/zip"),
            other => panic!("expected unsupported type, got {:?}", other),
        }
    }
}
