//! Detail pass: construction, closures and embellishments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::agents::{prompts, request_object};
use crate::analysis::json::fields;
use crate::error::Result;
use crate::services::{ImageInput, VisionModel};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailAnalysis {
    pub construction_details: Vec<String>,
    pub embellishments: Vec<String>,
    pub closures: Vec<String>,
    pub fabrics: Vec<String>,
    pub fit: Option<String>,
    pub condition: Option<String>,
    pub description: Option<String>,
}

impl DetailAnalysis {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            construction_details: fields::string_list(map, "construction_details"),
            embellishments: fields::string_list(map, "embellishments"),
            closures: fields::string_list(map, "closures"),
            fabrics: fields::string_list(map, "fabrics"),
            fit: fields::string(map, "fit"),
            condition: fields::string(map, "condition"),
            description: fields::string(map, "description"),
        }
    }
}

/// Looks closely at how a garment is made and decorated
pub struct DetailAnalyzer {
    model: Arc<dyn VisionModel>,
}

impl DetailAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self { model }
    }

    /// Run the detail pass; `context` is a summary from earlier passes
    pub async fn analyze(&self, image: &ImageInput, context: Option<&str>) -> Result<DetailAnalysis> {
        debug!("Running detail analysis with {}", self.model.model_name());
        let prompt = prompts::detail_prompt(context);
        let map = request_object(self.model.as_ref(), &prompt, Some(image)).await?;
        Ok(DetailAnalysis::from_map(&map))
    }
}
