//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::SecretString;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wardrobe_core::{
    api::{ApiServer, AppState},
    config::{OnboardingSettings, VisionProvider},
    error::{Result, WardrobeError},
    services::LlmConfig,
    ImageInput, MemoryStore, OnboardingRegistry, VisionModel, WardrobeConfig, WardrobeStore,
};

/// Vision model that answers from a script, one reply per call
pub struct StubVision {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<usize>,
}

impl StubVision {
    pub fn new(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(0),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl VisionModel for StubVision {
    async fn complete(&self, _prompt: &str, _image: Option<&ImageInput>) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WardrobeError::LlmApi("stub has no replies left".to_string())))
    }

    fn model_name(&self) -> &str {
        "stub-vision"
    }

    fn provider(&self) -> VisionProvider {
        VisionProvider::Claude
    }
}

/// Base64 of a PNG header followed by `seed`, so each seed hashes differently
pub fn png_base64(seed: u8) -> String {
    STANDARD.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, seed])
}

pub fn sample_image() -> ImageInput {
    ImageInput::from_base64(&png_base64(0), None).expect("valid sample image")
}

/// Client settings pointed at a mock server, with fast retries
pub fn llm_config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
    LlmConfig {
        api_key: api_key.map(|k| SecretString::from(k.to_string())),
        model: "test-model".to_string(),
        base_url: base_url.to_string(),
        max_tokens: 512,
        temperature: 0.0,
        timeout: Duration::from_secs(5),
        max_attempts: 3,
        backoff_base_ms: 1,
    }
}

/// App state over a stub model and an in-memory store
pub fn test_state(model: Arc<StubVision>) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        &WardrobeConfig::default(),
        model,
        store.clone() as Arc<dyn WardrobeStore>,
        OnboardingRegistry::new(&OnboardingSettings::default()),
    );
    (state, store)
}

pub fn test_router(model: Arc<StubVision>) -> axum::Router {
    ApiServer::build_router(test_state(model).0)
}

/// A multi-item reply with `n` distinctly named tops
pub fn multi_item_reply(n: usize) -> String {
    let items: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "name": format!("Black tee {}", i),
                "category": "tops",
                "colors": ["black"],
                "confidence": 0.85
            })
        })
        .collect();
    format!("```json\n{}\n```", serde_json::json!({ "items": items }))
}
