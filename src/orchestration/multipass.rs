//! Multi-pass garment analysis
//!
//! Runs identify, detail and style passes in order over one image. A failed
//! pass is recorded and the chain carries on with what it has; the run only
//! fails when every pass does. Results are merged (first non-empty scalar
//! wins, lists are unioned), enriched with vocabulary matches over the
//! descriptions, and scored.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::{
    DetailAnalysis, DetailAnalyzer, GarmentAnalysis, GarmentAnalyzer, StyleAnalysis, StyleAnalyst,
};
use crate::analysis::confidence::{blend_with_model, ConfidenceScore, Signal};
use crate::analysis::keywords::{detect_embellishments, extract_attributes, merge_unique, EmbellishmentReport};
use crate::error::{Result, WardrobeError};
use crate::services::{ImageInput, VisionModel};
use crate::types::{Category, IntakeSource, WardrobeItem};

/// One step of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Identify,
    Detail,
    Style,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pass::Identify => write!(f, "identify"),
            Pass::Detail => write!(f, "detail"),
            Pass::Style => write!(f, "style"),
        }
    }
}

/// A pass that did not produce a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassFailure {
    pub pass: Pass,
    /// Error kind, as reported by the API
    pub kind: String,
    pub message: String,
}

/// Union of what all successful passes reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedAnalysis {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub colors: Vec<String>,
    pub fabrics: Vec<String>,
    pub patterns: Vec<String>,
    pub styles: Vec<String>,
    pub embellishments: Vec<String>,
    pub construction_details: Vec<String>,
    pub closures: Vec<String>,
    pub fit: Option<String>,
    pub condition: Option<String>,
    pub occasions: Vec<String>,
    pub seasons: Vec<String>,
    pub pairing_suggestions: Vec<String>,
    /// Descriptions from each pass, in pass order
    pub descriptions: Vec<String>,
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl MergedAnalysis {
    pub fn absorb_garment(&mut self, garment: GarmentAnalysis) {
        fill(&mut self.name, garment.name);
        fill(&mut self.category, garment.category);
        fill(&mut self.subcategory, garment.subcategory);
        fill(&mut self.brand, garment.brand);
        merge_unique(&mut self.colors, garment.colors);
        merge_unique(&mut self.fabrics, garment.fabrics);
        merge_unique(&mut self.patterns, garment.patterns);
        merge_unique(&mut self.styles, garment.styles);
        merge_unique(&mut self.descriptions, garment.description);
    }

    pub fn absorb_detail(&mut self, detail: DetailAnalysis) {
        fill(&mut self.fit, detail.fit);
        fill(&mut self.condition, detail.condition);
        merge_unique(&mut self.fabrics, detail.fabrics);
        merge_unique(&mut self.embellishments, detail.embellishments);
        merge_unique(&mut self.construction_details, detail.construction_details);
        merge_unique(&mut self.closures, detail.closures);
        merge_unique(&mut self.descriptions, detail.description);
    }

    pub fn absorb_style(&mut self, style: StyleAnalysis) {
        merge_unique(&mut self.styles, style.styles);
        merge_unique(&mut self.occasions, style.occasions);
        merge_unique(&mut self.seasons, style.seasons);
        merge_unique(&mut self.pairing_suggestions, style.pairing_suggestions);
        merge_unique(&mut self.descriptions, style.description);
    }

    /// All free text the passes produced, for keyword scanning
    fn scan_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.name.as_deref());
        parts.extend(self.subcategory.as_deref());
        parts.extend(self.descriptions.iter().map(String::as_str));
        parts.extend(self.construction_details.iter().map(String::as_str));
        parts.join(". ")
    }

    /// Add vocabulary matches the model left out of its lists
    pub fn enrich_from_vocabulary(&mut self) -> EmbellishmentReport {
        let text = self.scan_text();
        let found = extract_attributes(&text);
        merge_unique(&mut self.colors, found.colors);
        merge_unique(&mut self.fabrics, found.fabrics);
        merge_unique(&mut self.patterns, found.patterns);
        merge_unique(&mut self.styles, found.styles);

        let mut report = detect_embellishments(&text);
        report.absorb_labels(&self.embellishments);
        merge_unique(&mut self.embellishments, report.matched_terms.iter().cloned());
        report
    }

    /// Heuristic score over the merged attributes
    pub fn score(&self, embellishments: &EmbellishmentReport) -> ConfidenceScore {
        let mut score = ConfidenceScore::new();
        score
            .observe(Signal::Category, self.category.is_some())
            .observe(Signal::Colors, !self.colors.is_empty())
            .observe(Signal::Fabrics, !self.fabrics.is_empty())
            .observe(Signal::Brand, self.brand.is_some())
            .observe(Signal::Patterns, !self.patterns.is_empty())
            .observe(Signal::Styles, !self.styles.is_empty())
            .observe(Signal::Embellishments, embellishments.any() || !self.embellishments.is_empty());
        score
    }

    /// Display name, falling back through subcategory and category
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.subcategory.clone())
            .or_else(|| self.category.map(|c| c.to_string()))
            .unwrap_or_else(|| "Unidentified item".to_string())
    }
}

/// Outcome of a multi-pass run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: MergedAnalysis,
    pub embellishment_report: EmbellishmentReport,
    /// Final confidence in `[0, 1]`
    pub confidence: f32,
    pub signals: Vec<Signal>,
    pub model_confidence: Option<f32>,
    pub passes_completed: Vec<Pass>,
    pub failures: Vec<PassFailure>,
    pub model: String,
}

impl AnalysisReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Catalog entry for this analysis
    pub fn to_item(
        &self,
        user_id: &str,
        review_threshold: f32,
        source: IntakeSource,
    ) -> Result<WardrobeItem> {
        let analysis = &self.analysis;
        let mut item = WardrobeItem::new(
            user_id,
            analysis.display_name(),
            analysis.category.unwrap_or(Category::Other),
            self.confidence,
            review_threshold,
            source,
        );
        item.subcategory = analysis.subcategory.clone();
        item.brand = analysis.brand.clone();
        item.colors = analysis.colors.clone();
        item.fabrics = analysis.fabrics.clone();
        item.patterns = analysis.patterns.clone();
        item.styles = analysis.styles.clone();
        item.embellishments = analysis.embellishments.clone();
        item.raw_analysis = serde_json::to_value(self)?;
        Ok(item)
    }
}

/// Chains the garment, detail and style agents over one image
pub struct MultiPassAnalyzer {
    model_name: String,
    garment: GarmentAnalyzer,
    detail: DetailAnalyzer,
    style: StyleAnalyst,
}

impl MultiPassAnalyzer {
    pub fn new(model: Arc<dyn VisionModel>) -> Self {
        Self {
            model_name: model.model_name().to_string(),
            garment: GarmentAnalyzer::new(model.clone()),
            detail: DetailAnalyzer::new(model.clone()),
            style: StyleAnalyst::new(model),
        }
    }

    pub fn garment_analyzer(&self) -> &GarmentAnalyzer {
        &self.garment
    }

    pub fn detail_analyzer(&self) -> &DetailAnalyzer {
        &self.detail
    }

    pub fn style_analyst(&self) -> &StyleAnalyst {
        &self.style
    }

    pub async fn run(&self, image: &ImageInput) -> Result<AnalysisReport> {
        let mut merged = MergedAnalysis::default();
        let mut passes_completed = Vec::new();
        let mut failures = Vec::new();
        let mut first_error: Option<WardrobeError> = None;

        let mut record_failure = |pass: Pass, error: WardrobeError| {
            warn!("{} pass failed, continuing with partial data: {}", pass, error);
            failures.push(PassFailure {
                pass,
                kind: error.kind().to_string(),
                message: error.to_string(),
            });
            if first_error.is_none() {
                first_error = Some(error);
            }
        };

        let mut model_confidence = None;
        let mut context = None;
        match self.garment.analyze(image).await {
            Ok(garment) => {
                model_confidence = garment.model_confidence;
                context = garment.summary();
                merged.absorb_garment(garment);
                passes_completed.push(Pass::Identify);
            }
            Err(e) => record_failure(Pass::Identify, e),
        }

        match self.detail.analyze(image, context.as_deref()).await {
            Ok(detail) => {
                merged.absorb_detail(detail);
                passes_completed.push(Pass::Detail);
            }
            Err(e) => record_failure(Pass::Detail, e),
        }

        match self.style.analyze(image, context.as_deref()).await {
            Ok(style) => {
                merged.absorb_style(style);
                passes_completed.push(Pass::Style);
            }
            Err(e) => record_failure(Pass::Style, e),
        }

        if passes_completed.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| WardrobeError::Other("no analysis pass ran".to_string())));
        }

        let embellishment_report = merged.enrich_from_vocabulary();
        let score = merged.score(&embellishment_report);
        let confidence = blend_with_model(score.value(), model_confidence);

        info!(
            "Multi-pass analysis finished: {}/3 passes, confidence {:.2}",
            passes_completed.len(),
            confidence
        );

        Ok(AnalysisReport {
            analysis: merged,
            embellishment_report,
            confidence,
            signals: score.signals().to_vec(),
            model_confidence,
            passes_completed,
            failures,
            model: self.model_name.clone(),
        })
    }
}
