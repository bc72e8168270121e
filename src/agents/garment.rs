//! Identification pass: name, category and core attributes of one garment

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::agents::{prompts, request_object};
use crate::analysis::json::fields;
use crate::error::Result;
use crate::services::{ImageInput, VisionModel};
use crate::types::Category;
use crate::vocabulary::category_from_text;

/// What the identification pass reports about a garment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GarmentAnalysis {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub colors: Vec<String>,
    pub fabrics: Vec<String>,
    pub patterns: Vec<String>,
    pub styles: Vec<String>,
    pub description: Option<String>,
    /// Confidence the model claimed for itself
    pub model_confidence: Option<f32>,
}

impl GarmentAnalysis {
    /// Map a parsed reply object
    ///
    /// An unrecognised category label falls back to cue words in the name,
    /// subcategory and description.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let name = fields::string(map, "name").or_else(|| fields::string(map, "item_name"));
        let subcategory = fields::string(map, "subcategory").or_else(|| fields::string(map, "type"));
        let description = fields::string(map, "description");

        let category = fields::string(map, "category")
            .map(|label| Category::parse_lenient(&label))
            .filter(|c| *c != Category::Other)
            .or_else(|| {
                let cues = [&name, &subcategory, &description]
                    .iter()
                    .filter_map(|s| s.as_deref())
                    .collect::<Vec<_>>()
                    .join(" ");
                category_from_text(&cues)
            });

        Self {
            name,
            category,
            subcategory,
            brand: fields::string(map, "brand"),
            colors: fields::string_list(map, "colors"),
            fabrics: fields::string_list(map, "fabrics"),
            patterns: fields::string_list(map, "patterns"),
            styles: fields::string_list(map, "styles"),
            description,
            model_confidence: fields::confidence(map, "confidence"),
        }
    }

    /// One-line summary handed to later passes as context
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.colors.is_empty() {
            parts.push(self.colors.join("/"));
        }
        if !self.fabrics.is_empty() {
            parts.push(self.fabrics.join("/"));
        }
        match (&self.name, &self.subcategory, self.category) {
            (Some(name), _, _) => parts.push(name.clone()),
            (None, Some(sub), _) => parts.push(sub.clone()),
            (None, None, Some(category)) => parts.push(category.to_string()),
            (None, None, None) => {}
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Identifies a single garment from a photo
pub struct GarmentAnalyzer {
    model: Arc<dyn VisionModel>,
}

impl GarmentAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    pub async fn analyze(&self, image: &ImageInput) -> Result<GarmentAnalysis> {
        debug!("Running garment identification with {}", self.model.model_name());
        let map = request_object(self.model.as_ref(), &prompts::garment_prompt(), Some(image)).await?;
        Ok(GarmentAnalysis::from_map(&map))
    }
}
