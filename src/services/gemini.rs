//! Gemini vision client
//!
//! Talks to the `generateContent` endpoint of the Generative Language API.
//! The reply's text parts are concatenated into one string so analyzers see
//! the same shape they get from Claude.

use crate::config::VisionProvider;
use crate::error::{Result, WardrobeError};
use crate::services::image::ImageInput;
use crate::services::llm::{error_for_status, LlmConfig, VisionModel};
use crate::services::retry::with_retry;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct GeminiVision {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiVision {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    async fn call_api(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        let api_key = self.config.require_key("GEMINI_API_KEY")?;
        debug!(
            "Calling Gemini API: model {}, image: {}",
            self.config.model,
            image.is_some()
        );

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: image.media_type(),
                    data: image.data(),
                },
            });
        }
        parts.push(RequestPart::Text { text: prompt });

        let request = GenerateRequest {
            contents: vec![RequestContent { role: "user", parts }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.config.base_url, self.config.model
            ))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_for_status("Gemini API", status, &error_text));
        }

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| WardrobeError::ModelOutput(format!("Failed to parse response: {}", e)))?;

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            let feedback = api_response
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_default();
            return Err(WardrobeError::LlmApi(format!(
                "Gemini returned no candidates {}",
                feedback
            )));
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Gemini finished with reason {}", reason);
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(WardrobeError::ModelOutput("Empty response from API".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl VisionModel for GeminiVision {
    async fn complete(&self, prompt: &str, image: Option<&ImageInput>) -> Result<String> {
        with_retry(
            "Gemini API call",
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
        VisionProvider::Gemini
    }
}
