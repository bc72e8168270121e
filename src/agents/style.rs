//! Style pass: aesthetics, occasions and pairings

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::agents::{prompts, request_object};
use crate::analysis::json::fields;
use crate::error::Result;
use crate::services::{ImageInput, VisionModel};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    pub styles: Vec<String>,
    pub occasions: Vec<String>,
    pub seasons: Vec<String>,
    pub pairing_suggestions: Vec<String>,
    pub description: Option<String>,
}

impl StyleAnalysis {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut styles = fields::string_list(map, "styles");
        if styles.is_empty() {
            styles = fields::string_list(map, "style");
        }
        Self {
            styles,
            occasions: fields::string_list(map, "occasions"),
            seasons: fields::string_list(map, "seasons"),
            pairing_suggestions: fields::string_list(map, "pairing_suggestions"),
            description: fields::string(map, "description").or_else(|| fields::string(map, "style_notes")),
        }
    }
}

pub struct StyleAnalyst {
    model: Arc<dyn VisionModel>,
}

impl StyleAnalyst {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn analyze(&self, image: &ImageInput, context: Option<&str>) -> Result<StyleAnalysis> {
        debug!("Running style analysis with {}", self.model.model_name());
        let prompt = prompts::style_prompt(context);
        let map = request_object(self.model.as_ref(), &prompt, Some(image)).await?;
        Ok(StyleAnalysis::from_map(&map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_map_accepts_singular_style_key() {
        let value = json!({"style": "minimalist", "seasons": ["autumn", "winter"], "style_notes": "Clean lines."});
        let style = StyleAnalysis::from_map(value.as_object().unwrap());
        assert_eq!(style.styles, vec!["minimalist"]);
        assert_eq!(style.seasons.len(), 2);
        assert_eq!(style.description.as_deref(), Some("Clean lines."));
    }
}
