//! Vision model service
//!
//! Provides integration with Claude for:
//! - Garment identification from photos
//! - Detail and style passes
//! - Receipt reading
//!
//! Every analyzer talks to a model through the [`VisionModel`] trait so the
//! provider can be swapped in configuration and stubbed in tests.

use crate::config::{VisionProvider, VisionSettings, WardrobeConfig};
use crate::error::{Result, WardrobeError};
use crate::services::image::ImageInput;
use crate::services::retry::with_retry;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A hosted model that answers a prompt about an optional image
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one prompt and return the model's text reply
    async fn complete(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String>;

    /// Model identifier, recorded alongside analyses
    fn model_name(&self) -> &str;

    fn provider(&self) -> VisionProvider;
}

/// Configuration shared by the hosted vision clients
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key; requests fail with an authentication error when unset
    pub api_key: Option<SecretString>,

    /// Model to use
    pub model: String,

    /// API root, overridable for tests and proxies
    pub base_url: String,

    /// Max tokens for responses
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,

    pub timeout: Duration,
    pub max_attempts: usize,
    pub backoff_base_ms: u64,
}

impl LlmConfig {
    fn from_settings(vision: &VisionSettings, api_key: Option<SecretString>, model: &str, base_url: &str) -> Self {
        Self {
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_tokens: vision.max_tokens,
            temperature: vision.temperature,
            timeout: Duration::from_secs(vision.timeout_secs),
            max_attempts: vision.max_attempts,
            backoff_base_ms: vision.backoff_base_ms,
        }
    }

    /// Claude settings from the effective configuration
    pub fn claude(config: &WardrobeConfig) -> Self {
        let vision = &config.settings.vision;
        Self::from_settings(
            vision,
            config.credentials.anthropic_api_key.clone(),
            &vision.claude_model,
            &vision.anthropic_base_url,
        )
    }

    /// Gemini settings from the effective configuration
    pub fn gemini(config: &WardrobeConfig) -> Self {
        let vision = &config.settings.vision;
        Self::from_settings(
            vision,
            config.credentials.gemini_api_key.clone(),
            &vision.gemini_model,
            &vision.gemini_base_url,
        )
    }

    pub(crate) fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| WardrobeError::Network(format!("Failed to build HTTP client: {}", e)))
    }

    pub(crate) fn require_key(&self, env_name: &str) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or_else(|| WardrobeError::Authentication(format!("{} not set", env_name)))
    }
}

/// Map a non-success HTTP status from a model provider to an error
pub(crate) fn error_for_status(provider: &str, status: StatusCode, body: &str) -> WardrobeError {
    let message = format!("{} returned {}: {}", provider, status, truncate(body, 300));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WardrobeError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => WardrobeError::RateLimitExceeded(message),
        s if s.is_server_error() => WardrobeError::Upstream {
            status: s.as_u16(),
            message,
        },
        _ => WardrobeError::LlmApi(message),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Claude vision client
pub struct ClaudeVision {
    config: LlmConfig,
    client: Client,
}

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeVision {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    async fn call_api(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        let api_key = self.config.require_key("ANTHROPIC_API_KEY")?;
        debug!(
            "Calling Anthropic API: model {}, image: {}",
            self.config.model,
            image.is_some()
        );

        // Image first, then the instructions
        let mut content = Vec::with_capacity(2);
        if let Some(image) = image {
            content.push(ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: image.media_type(),
                    data: image.data(),
                },
            });
        }
        content.push(ContentBlock::Text { text: prompt });

        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_for_status("Anthropic API", status, &error_text));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| WardrobeError::ModelOutput(format!("Failed to parse response: {}", e)))?;

        let text: Vec<String> = api_response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            return Err(WardrobeError::ModelOutput("Empty response from API".to_string()));
        }
        Ok(text.join("\n"))
    }
}

#[async_trait]
impl VisionModel for ClaudeVision {
    async fn complete(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        with_retry(
            "Anthropic API call",
            self.config.max_attempts,
            self.config.backoff_base_ms,
            || self.call_api(prompt, image),
        )
        .await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn provider(&self) -> VisionProvider {
        VisionProvider::Claude
    }
}
