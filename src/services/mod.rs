//! Services layer for the wardrobe analyzer
//!
//! Provides hosted vision model clients, image payload handling and retry.

pub mod gemini;
pub mod image;
pub mod llm;
pub mod retry;

use std::sync::Arc;

use crate::config::{VisionProvider, WardrobeConfig};
use crate::error::Result;

pub use gemini::GeminiVision;
pub use image::{sha256_hex, sniff_media_type, ImageInput, SUPPORTED_MEDIA_TYPES};
pub use llm::{ClaudeVision, LlmConfig, VisionModel};

/// Build the configured vision provider
pub fn vision_from_config(config: &WardrobeConfig) -> Result<Arc<dyn VisionModel>> {
    let model: Arc<dyn VisionModel> = match config.settings.vision.provider {
        VisionProvider::Claude => Arc::new(ClaudeVision::new(LlmConfig::claude(config))?),
        VisionProvider::Gemini => Arc::new(GeminiVision::new(LlmConfig::gemini(config))?),
    };
    Ok(model)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model for unit tests

    use super::{ImageInput, VisionModel};
    use crate::config::VisionProvider;
    use crate::error::{Result, WardrobeError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replies in order, one per `complete` call, recording each prompt
    pub struct ScriptedVision {
        replies: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedVision {
        pub fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn replying(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedVision {
        async fn complete(&self, prompt: &str, _image: Option<&ImageInput>) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(WardrobeError::LlmApi("no scripted reply left".to_string())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }

        fn provider(&self) -> VisionProvider {
            VisionProvider::Claude
        }
    }

    /// A tiny valid PNG header, enough for `ImageInput`
    pub fn sample_image() -> ImageInput {
        ImageInput::from_bytes(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], None).unwrap()
    }
}
