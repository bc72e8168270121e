//! Multi-item detection for outfit and flat-lay photos

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::agents::prompts;
use crate::analysis::confidence::{mean_confidence, ConfidenceScore, Signal};
use crate::analysis::json::{extract_json, fields};
use crate::error::{Result, WardrobeError};
use crate::services::{ImageInput, VisionModel};
use crate::types::{clamp_confidence, Category};
use crate::vocabulary::{category_from_text, COLORS};

/// One garment found in a photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    pub name: String,
    pub category: Category,
    pub colors: Vec<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub confidence: f32,
    /// The reply object this item was read from
    pub raw: Value,
}

impl DetectedItem {
    /// Read one entry of the `items` array; entries without any name,
    /// category or description are dropped
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let description = fields::string(map, "description");
        let label = fields::string(map, "category");
        let name = fields::string(map, "name")
            .or_else(|| fields::string(map, "item"))
            .or_else(|| label.clone())
            .or_else(|| description.clone())?;

        let category = label
            .as_deref()
            .map(Category::parse_lenient)
            .filter(|c| *c != Category::Other)
            .or_else(|| category_from_text(&format!("{} {}", name, description.as_deref().unwrap_or(""))));

        let mut colors = fields::string_list(map, "colors");
        if colors.is_empty() {
            colors = COLORS.matches(&name);
        }

        // Without a model figure, score on what the entry actually carries
        let confidence = fields::confidence(map, "confidence").unwrap_or_else(|| {
            ConfidenceScore::new()
                .observe(Signal::Category, category.is_some())
                .observe(Signal::Colors, !colors.is_empty())
                .value()
        });

        Some(Self {
            name,
            category: category.unwrap_or(Category::Other),
            colors,
            position: fields::string(map, "position").or_else(|| fields::string(map, "location")),
            description,
            confidence: clamp_confidence(confidence),
            raw: Value::Object(map.clone()),
        })
    }
}

/// All items found in one photo
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiItemDetection {
    pub items: Vec<DetectedItem>,
    /// Mean item confidence; `None` when nothing was detected
    pub overall_confidence: Option<f32>,
}

impl MultiItemDetection {
    pub fn new(items: Vec<DetectedItem>) -> Self {
        let confidences: Vec<f32> = items.iter().map(|item| item.confidence).collect();
        Self {
            overall_confidence: mean_confidence(&confidences),
            items,
        }
    }

    /// Accepts `{"items": [...]}` or a bare array
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(map) => match map.get("items").or_else(|| map.get("garments")) {
                Some(Value::Array(entries)) => entries,
                Some(_) => {
                    return Err(WardrobeError::ModelOutput(
                        "items field is not an array".to_string(),
                    ))
                }
                None => return Ok(Self::new(Vec::new())),
            },
            _ => {
                return Err(WardrobeError::ModelOutput(
                    "expected an items list from the detector".to_string(),
                ))
            }
        };

        let items = entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(DetectedItem::from_map)
            .collect();
        Ok(Self::new(items))
    }
}

pub struct MultiItemDetector {
    model: Arc<dyn VisionModel>,
}

impl MultiItemDetector {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn detect(&self, image: &ImageInput) -> Result<MultiItemDetection> {
        debug!("Running multi-item detection with {}", self.model.model_name());
        let reply = self
            .model
            .complete(&prompts::multi_item_prompt(), Some(image))
            .await?;
        let detection = MultiItemDetection::from_value(&extract_json(&reply)?)?;
        info!("Detected {} items", detection.items.len());
        Ok(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{sample_image, ScriptedVision};
    use serde_json::json;

    #[test]
    fn test_empty_detection_has_no_confidence() {
        let detection = MultiItemDetection::from_value(&json!({"items": []})).unwrap();
        assert!(detection.items.is_empty());
        assert_eq!(detection.overall_confidence, None);
    }

    #[test]
    fn test_bare_array_and_heuristic_confidence() {
        let detection = MultiItemDetection::from_value(&json!([
            {"name": "white sneakers"},
            {"name": "Leather belt", "category": "accessories", "confidence": 0.9},
            "not an object"
        ]))
        .unwrap();

        assert_eq!(detection.items.len(), 2);
        let sneakers = &detection.items[0];
        assert_eq!(sneakers.category, Category::Shoes);
        assert_eq!(sneakers.colors, vec!["white"]);
        assert!((sneakers.confidence - 0.65).abs() < 1e-6);
        let overall = detection.overall_confidence.unwrap();
        assert!((overall - 0.775).abs() < 1e-6);
    }

    #[test]
    fn test_items_must_be_a_list() {
        assert!(MultiItemDetection::from_value(&json!({"items": "shirt"})).is_err());
        assert!(MultiItemDetection::from_value(&json!("shirt")).is_err());
    }

    #[tokio::test]
    async fn test_detect() {
        let model = ScriptedVision::replying(&[
            r#"{"items": [{"name": "Striped tee", "category": "tops", "colors": ["navy", "white"], "position": "upper body", "confidence": "80%"}]}"#,
        ]);
        let detection = MultiItemDetector::new(model).detect(&sample_image()).await.unwrap();
        assert_eq!(detection.items.len(), 1);
        assert_eq!(detection.items[0].position.as_deref(), Some("upper body"));
        assert_eq!(detection.overall_confidence, Some(0.8));
    }
}
