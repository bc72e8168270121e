//! Upload intake
//!
//! The logic behind the upload endpoints: validate the request, dedupe on
//! the image hash, run the matching analyzer, catalog what it found and
//! close out the detection session. Item saves are independent; one
//! failing save is reported in `failed_items` and the rest still land.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::agents::{
    DetailAnalysis, DetectedItem, GarmentAnalysis, MultiItemDetection, MultiItemDetector,
    ReceiptAnalysis, ReceiptAnalyzer, StyleAnalysis,
};
use crate::analysis::confidence::{mean_confidence, ConfidenceScore, Signal};
use crate::analysis::keywords::{detect_embellishments, extract_attributes, merge_unique};
use crate::config::AnalysisSettings;
use crate::error::{Result, WardrobeError};
use crate::onboarding::{OnboardingRegistry, OnboardingSession};
use crate::orchestration::{AnalysisReport, MultiPassAnalyzer};
use crate::services::{sha256_hex, ImageInput, VisionModel};
use crate::storage::{DetectionStart, WardrobeStore};
use crate::types::{Category, DetectionSession, IntakeSource, SessionId, WardrobeItem};
use crate::vocabulary::COLORS;

/// What the client says it uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    SingleItem,
    MultiItem,
    Outfit,
    Receipt,
}

impl InputType {
    pub fn source(&self) -> IntakeSource {
        match self {
            InputType::SingleItem => IntakeSource::SingleItem,
            InputType::MultiItem => IntakeSource::MultiItem,
            InputType::Outfit => IntakeSource::Outfit,
            InputType::Receipt => IntakeSource::Receipt,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub input_type: InputType,
    /// Base64 image or data URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    /// Receipt text, accepted instead of an image for receipts
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub onboarding_session_id: Option<SessionId>,
}

/// An analyzed item that could not be saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedItem {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session: DetectionSession,
    /// True when this image was already uploaded; nothing was re-analyzed
    pub duplicate: bool,
    pub items: Vec<WardrobeItem>,
    pub failed_items: Vec<FailedItem>,
    #[serde(default)]
    pub onboarding: Option<OnboardingSession>,
    /// Analyzer output the items were built from
    #[serde(default)]
    pub analysis: Option<Value>,
}

/// Analyzer selection for analysis without persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Basic,
    Detailed,
    Style,
    #[default]
    Multipass,
    MultiItem,
    Receipt,
}

impl std::str::FromStr for AnalysisType {
    type Err = WardrobeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "basic" => Ok(AnalysisType::Basic),
            "detailed" => Ok(AnalysisType::Detailed),
            "style" => Ok(AnalysisType::Style),
            "multipass" | "multi_pass" => Ok(AnalysisType::Multipass),
            "multi_item" => Ok(AnalysisType::MultiItem),
            "receipt" => Ok(AnalysisType::Receipt),
            other => Err(WardrobeError::Validation(format!("unknown analysis type {}", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "analysis_type", content = "result", rename_all = "snake_case")]
pub enum AnalysisOutput {
    Basic(GarmentAnalysis),
    Detailed {
        garment: GarmentAnalysis,
        detail: DetailAnalysis,
    },
    Style(StyleAnalysis),
    Multipass(AnalysisReport),
    MultiItem(MultiItemDetection),
    Receipt(ReceiptAnalysis),
}

/// Decoded upload content
enum Payload {
    Image(ImageInput),
    Text(String),
}

impl Payload {
    fn from_parts(
        image: Option<&str>,
        media_type: Option<&str>,
        text: Option<&str>,
        allow_text: bool,
    ) -> Result<Self> {
        if let Some(image) = image.filter(|i| !i.trim().is_empty()) {
            return Ok(Payload::Image(ImageInput::from_base64(image, media_type)?));
        }
        match text.filter(|t| !t.trim().is_empty()) {
            Some(text) if allow_text => Ok(Payload::Text(text.to_string())),
            _ if allow_text => Err(WardrobeError::Validation(
                "receipt uploads need an image or text".to_string(),
            )),
            _ => Err(WardrobeError::Validation("image is required".to_string())),
        }
    }

    fn content_hash(&self) -> String {
        match self {
            Payload::Image(image) => image.image_hash().to_string(),
            Payload::Text(text) => sha256_hex(text.trim().as_bytes()),
        }
    }

    fn image(&self) -> Result<&ImageInput> {
        match self {
            Payload::Image(image) => Ok(image),
            Payload::Text(_) => Err(WardrobeError::Validation("image is required".to_string())),
        }
    }
}

/// Items an analyzer produced, before they are saved
struct Candidates {
    items: Vec<WardrobeItem>,
    analysis: Value,
}

pub struct IntakeService {
    multipass: MultiPassAnalyzer,
    detector: MultiItemDetector,
    receipts: ReceiptAnalyzer,
    store: Arc<dyn WardrobeStore>,
    onboarding: OnboardingRegistry,
    review_threshold: f32,
}

impl IntakeService {
    pub fn new(
        model: Arc<dyn VisionModel>,
        store: Arc<dyn WardrobeStore>,
        onboarding: OnboardingRegistry,
        settings: &AnalysisSettings,
    ) -> Self {
        Self {
            multipass: MultiPassAnalyzer::new(model.clone()),
            detector: MultiItemDetector::new(model.clone()),
            receipts: ReceiptAnalyzer::new(model),
            store,
            onboarding,
            review_threshold: settings.review_threshold,
        }
    }

    pub fn store(&self) -> &Arc<dyn WardrobeStore> {
        &self.store
    }

    pub fn onboarding(&self) -> &OnboardingRegistry {
        &self.onboarding
    }

    /// Analyze an upload and catalog the items found
    ///
    /// Duplicates are keyed on the user and the content hash alone. Uploading
    /// a photo again under another `input_type` returns the first session's
    /// items.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(WardrobeError::Validation("user_id is required".to_string()));
        }
        if let Some(id) = &request.onboarding_session_id {
            if self.onboarding.get(id).await.is_none() {
                return Err(WardrobeError::NotFound(format!("onboarding session {}", id)));
            }
        }

        let payload = Payload::from_parts(
            request.image.as_deref(),
            request.media_type.as_deref(),
            request.text.as_deref(),
            request.input_type == InputType::Receipt,
        )?;

        let session = match self.store.begin_detection(user_id, &payload.content_hash()).await? {
            DetectionStart::Duplicate(session) => {
                info!("Upload from {} duplicates session {}", user_id, session.id);
                let items = self.store.list_session_items(session.id).await?;
                // Items were counted toward onboarding the first time round
                let onboarding = match &request.onboarding_session_id {
                    Some(id) => self.onboarding.get(id).await,
                    None => None,
                };
                return Ok(UploadResponse {
                    session,
                    duplicate: true,
                    items,
                    failed_items: Vec::new(),
                    onboarding,
                    analysis: None,
                });
            }
            DetectionStart::New(session) => session,
        };
        debug!("Started detection session {} ({:?})", session.id, request.input_type);

        let source = if request.onboarding_session_id.is_some() {
            IntakeSource::Onboarding
        } else {
            request.input_type.source()
        };

        let candidates = match self
            .run_analyzer(request.input_type, &payload, user_id, source)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Analysis failed for session {}: {}", session.id, e);
                if let Err(mark) = self.store.fail_detection(session.id, &e.to_string()).await {
                    warn!("Could not mark session {} failed: {}", session.id, mark);
                }
                return Err(e);
            }
        };

        let mut items = Vec::with_capacity(candidates.items.len());
        let mut failed_items = Vec::new();
        for mut item in candidates.items {
            item.detection_session_id = Some(session.id);
            match self.store.save_item(&item).await {
                Ok(saved) => items.push(saved),
                Err(e) => {
                    warn!("Failed to save item {:?}: {}", item.name, e);
                    failed_items.push(FailedItem {
                        name: item.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        let overall_confidence = mean_confidence(
            &items.iter().map(|item| item.confidence_score).collect::<Vec<_>>(),
        );
        let session = self
            .store
            .complete_detection(session.id, items.len(), overall_confidence)
            .await?;
        info!(
            "Session {} completed: {} saved, {} failed",
            session.id,
            items.len(),
            failed_items.len()
        );

        let onboarding = match &request.onboarding_session_id {
            Some(id) if !items.is_empty() => {
                let ids: Vec<_> = items.iter().map(|item| item.id).collect();
                match self.onboarding.add_items(id, ids.len() as u32, &ids).await {
                    Ok(progress) => Some(progress),
                    Err(e) => {
                        warn!("Could not record onboarding progress: {}", e);
                        None
                    }
                }
            }
            Some(id) => self.onboarding.get(id).await,
            None => None,
        };

        Ok(UploadResponse {
            session,
            duplicate: false,
            items,
            failed_items,
            onboarding,
            analysis: Some(candidates.analysis),
        })
    }

    async fn run_analyzer(
        &self,
        input_type: InputType,
        payload: &Payload,
        user_id: &str,
        source: IntakeSource,
    ) -> Result<Candidates> {
        match input_type {
            InputType::SingleItem => {
                let report = self.multipass.run(payload.image()?).await?;
                let item = report.to_item(user_id, self.review_threshold, source)?;
                Ok(Candidates {
                    items: vec![item],
                    analysis: serde_json::to_value(&report)?,
                })
            }
            InputType::MultiItem | InputType::Outfit => {
                let detection = self.detector.detect(payload.image()?).await?;
                let items = detection
                    .items
                    .iter()
                    .map(|detected| self.item_from_detection(detected, user_id, source))
                    .collect();
                Ok(Candidates {
                    items,
                    analysis: serde_json::to_value(&detection)?,
                })
            }
            InputType::Receipt => {
                let receipt = match payload {
                    Payload::Image(image) => self.receipts.analyze_image(image).await?,
                    Payload::Text(text) => self.receipts.analyze_text(text).await?,
                };
                let items = self.items_from_receipt(&receipt, user_id, source)?;
                Ok(Candidates {
                    items,
                    analysis: serde_json::to_value(&receipt)?,
                })
            }
        }
    }

    fn item_from_detection(&self, detected: &DetectedItem, user_id: &str, source: IntakeSource) -> WardrobeItem {
        let mut item = WardrobeItem::new(
            user_id,
            detected.name.clone(),
            detected.category,
            detected.confidence,
            self.review_threshold,
            source,
        );
        let text = format!("{} {}", detected.name, detected.description.as_deref().unwrap_or(""));
        let found = extract_attributes(&text);
        item.colors = detected.colors.clone();
        merge_unique(&mut item.colors, found.colors);
        item.fabrics = found.fabrics;
        item.patterns = found.patterns;
        item.styles = found.styles;
        item.embellishments = detect_embellishments(&text).matched_terms;
        item.raw_analysis = detected.raw.clone();
        item
    }

    fn items_from_receipt(
        &self,
        receipt: &ReceiptAnalysis,
        user_id: &str,
        source: IntakeSource,
    ) -> Result<Vec<WardrobeItem>> {
        receipt
            .items
            .iter()
            .map(|line| {
                let colors = COLORS.matches(&line.name);
                let confidence = ConfidenceScore::new()
                    .observe(Signal::Category, line.category.is_some())
                    .observe(Signal::Colors, !colors.is_empty())
                    .observe(Signal::Brand, receipt.store.is_some())
                    .value();
                let mut item = WardrobeItem::new(
                    user_id,
                    line.name.clone(),
                    line.category.unwrap_or(Category::Other),
                    confidence,
                    self.review_threshold,
                    source,
                );
                item.brand = receipt.store.clone();
                item.colors = colors;
                item.price = line.price;
                item.raw_analysis = serde_json::to_value(line)?;
                Ok(item)
            })
            .collect()
    }

    /// Run an analyzer without touching storage
    pub async fn analyze_only(&self, request: AnalyzeRequest) -> Result<AnalysisOutput> {
        let payload = Payload::from_parts(
            request.image.as_deref(),
            request.media_type.as_deref(),
            request.text.as_deref(),
            request.analysis_type == AnalysisType::Receipt,
        )?;

        let output = match request.analysis_type {
            AnalysisType::Basic => {
                AnalysisOutput::Basic(self.multipass.garment_analyzer().analyze(payload.image()?).await?)
            }
            AnalysisType::Detailed => {
                let image = payload.image()?;
                let garment = self.multipass.garment_analyzer().analyze(image).await?;
                let context = garment.summary();
                let detail = self
                    .multipass
                    .detail_analyzer()
                    .analyze(image, context.as_deref())
                    .await?;
                AnalysisOutput::Detailed { garment, detail }
            }
            AnalysisType::Style => {
                AnalysisOutput::Style(self.multipass.style_analyst().analyze(payload.image()?, None).await?)
            }
            AnalysisType::Multipass => AnalysisOutput::Multipass(self.multipass.run(payload.image()?).await?),
            AnalysisType::MultiItem => AnalysisOutput::MultiItem(self.detector.detect(payload.image()?).await?),
            AnalysisType::Receipt => AnalysisOutput::Receipt(match &payload {
                Payload::Image(image) => self.receipts.analyze_image(image).await?,
                Payload::Text(text) => self.receipts.analyze_text(text).await?,
            }),
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OnboardingSettings, StorageKind};
    use crate::services::testing::ScriptedVision;
    use crate::storage::MemoryStore;
    use crate::types::{DetectionStatus, ItemId};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    /// In-memory store that refuses to save one item by name
    struct RejectingStore {
        inner: MemoryStore,
        reject: &'static str,
    }

    #[async_trait]
    impl WardrobeStore for RejectingStore {
        async fn save_item(&self, item: &WardrobeItem) -> Result<WardrobeItem> {
            if item.name == self.reject {
                return Err(WardrobeError::Database("row violates check constraint".into()));
            }
            self.inner.save_item(item).await
        }

        async fn get_item(&self, id: ItemId) -> Result<WardrobeItem> {
            self.inner.get_item(id).await
        }

        async fn list_items(&self, user_id: &str, limit: usize) -> Result<Vec<WardrobeItem>> {
            self.inner.list_items(user_id, limit).await
        }

        async fn list_session_items(&self, session_id: SessionId) -> Result<Vec<WardrobeItem>> {
            self.inner.list_session_items(session_id).await
        }

        async fn delete_item(&self, id: ItemId) -> Result<()> {
            self.inner.delete_item(id).await
        }

        async fn begin_detection(&self, user_id: &str, image_hash: &str) -> Result<DetectionStart> {
            self.inner.begin_detection(user_id, image_hash).await
        }

        async fn complete_detection(
            &self,
            id: SessionId,
            item_count: usize,
            overall_confidence: Option<f32>,
        ) -> Result<DetectionSession> {
            self.inner.complete_detection(id, item_count, overall_confidence).await
        }

        async fn fail_detection(&self, id: SessionId, error: &str) -> Result<DetectionSession> {
            self.inner.fail_detection(id, error).await
        }

        async fn get_detection(&self, id: SessionId) -> Result<DetectionSession> {
            self.inner.get_detection(id).await
        }

        fn backend(&self) -> StorageKind {
            StorageKind::Memory
        }
    }

    fn png_b64(seed: u8) -> String {
        STANDARD.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, seed])
    }

    fn service(model: Arc<ScriptedVision>, store: Arc<dyn WardrobeStore>) -> IntakeService {
        IntakeService::new(
            model,
            store,
            OnboardingRegistry::new(&OnboardingSettings::default()),
            &AnalysisSettings::default(),
        )
    }

    fn upload(input_type: InputType, image: String) -> UploadRequest {
        UploadRequest {
            user_id: "user-1".into(),
            input_type,
            image: Some(image),
            ..Default::default()
        }
    }

    const OUTFIT: &str = r#"{"items": [
        {"name": "Navy blazer", "category": "outerwear", "colors": ["navy"], "confidence": 0.9},
        {"name": "White tee", "category": "tops", "confidence": 0.5}
    ]}"#;

    #[tokio::test]
    async fn test_single_item_upload_and_duplicate() {
        let model = ScriptedVision::replying(&[
            r#"{"name": "Camel Wool Coat", "category": "outerwear", "colors": ["camel"], "fabrics": ["wool"]}"#,
            r#"{"closures": ["buttons"]}"#,
            r#"{"styles": ["classic"]}"#,
        ]);
        let store: Arc<dyn WardrobeStore> = Arc::new(MemoryStore::new());
        let service = service(model.clone(), store.clone());

        let first = service.upload(upload(InputType::SingleItem, png_b64(1))).await.unwrap();
        assert!(!first.duplicate);
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].category, Category::Outerwear);
        assert_eq!(first.items[0].detection_session_id, Some(first.session.id));
        assert_eq!(first.session.status, DetectionStatus::Completed);
        assert_eq!(first.session.item_count, 1);

        // Same image again: no model calls, earlier items returned
        let second = service.upload(upload(InputType::SingleItem, png_b64(1))).await.unwrap();
        assert!(second.duplicate);
        assert_eq!(second.session.id, first.session.id);
        assert_eq!(second.items.len(), 1);
        assert_eq!(model.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_detection_completes_without_confidence() {
        let model = ScriptedVision::replying(&[r#"{"items": []}"#]);
        let service = service(model, Arc::new(MemoryStore::new()));

        let response = service.upload(upload(InputType::Outfit, png_b64(2))).await.unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.session.status, DetectionStatus::Completed);
        assert_eq!(response.session.overall_confidence, None);
    }

    #[tokio::test]
    async fn test_multi_item_flags_review() {
        let model = ScriptedVision::replying(&[OUTFIT]);
        let service = service(model, Arc::new(MemoryStore::new()));

        let response = service.upload(upload(InputType::MultiItem, png_b64(3))).await.unwrap();
        assert_eq!(response.items.len(), 2);
        assert!(!response.items[0].needs_review);
        assert!(response.items[1].needs_review);
        assert_eq!(response.items[1].colors, vec!["white"]);
        let overall = response.session.overall_confidence.unwrap();
        assert!((overall - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_analyzer_failure_marks_session_failed_and_allows_retry() {
        let model = ScriptedVision::new(vec![
            Err(WardrobeError::Authentication("bad key".into())),
            Ok(OUTFIT.to_string()),
        ]);
        let store: Arc<dyn WardrobeStore> = Arc::new(MemoryStore::new());
        let service = service(model, store.clone());

        let err = service
            .upload(upload(InputType::MultiItem, png_b64(4)))
            .await
            .unwrap_err();
        assert!(matches!(err, WardrobeError::Authentication(_)));

        let retry = service.upload(upload(InputType::MultiItem, png_b64(4))).await.unwrap();
        assert!(!retry.duplicate);
        assert_eq!(retry.items.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_is_reported_and_others_land() {
        let model = ScriptedVision::replying(&[OUTFIT]);
        let store: Arc<dyn WardrobeStore> = Arc::new(RejectingStore {
            inner: MemoryStore::new(),
            reject: "White tee",
        });
        let service = service(model, store.clone());

        let response = service.upload(upload(InputType::MultiItem, png_b64(9))).await.unwrap();
        assert_eq!(response.failed_items.len(), 1);
        assert_eq!(response.failed_items[0].name, "White tee");
        assert!(response.failed_items[0].error.contains("check constraint"));
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, "Navy blazer");

        assert_eq!(response.session.status, DetectionStatus::Completed);
        assert_eq!(response.session.item_count, 1);
        let overall = response.session.overall_confidence.unwrap();
        assert!((overall - 0.9).abs() < 1e-6);

        let stored = store.list_items("user-1", 10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Navy blazer");
    }

    #[tokio::test]
    async fn test_duplicate_keys_on_content_not_input_type() {
        let model = ScriptedVision::replying(&[
            r#"{"name": "Navy blazer", "category": "outerwear"}"#,
            r#"{}"#,
            r#"{}"#,
        ]);
        let service = service(model.clone(), Arc::new(MemoryStore::new()));

        let first = service.upload(upload(InputType::SingleItem, png_b64(12))).await.unwrap();
        let second = service.upload(upload(InputType::MultiItem, png_b64(12))).await.unwrap();
        assert!(second.duplicate);
        assert_eq!(second.session.id, first.session.id);
        assert_eq!(second.items[0].source, IntakeSource::SingleItem);
        assert_eq!(model.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_receipt_text_upload() {
        let model = ScriptedVision::replying(&[
            r#"{"store": "COS", "currency": "GBP", "items": [{"name": "Black merino cardigan", "price": "£79.00"}]}"#,
        ]);
        let service = service(model, Arc::new(MemoryStore::new()));
        let request = UploadRequest {
            user_id: "user-1".into(),
            input_type: InputType::Receipt,
            text: Some("COS\nBlack merino cardigan £79.00".into()),
            ..Default::default()
        };

        let response = service.upload(request).await.unwrap();
        let item = &response.items[0];
        assert_eq!(item.brand.as_deref(), Some("COS"));
        assert_eq!(item.category, Category::Tops);
        assert_eq!(item.price.unwrap().amount_minor, 7900);
        assert_eq!(item.source, IntakeSource::Receipt);
        assert!((item.confidence_score - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service(ScriptedVision::replying(&[]), Arc::new(MemoryStore::new()));

        let no_user = UploadRequest {
            image: Some(png_b64(5)),
            ..Default::default()
        };
        assert!(matches!(service.upload(no_user).await, Err(WardrobeError::Validation(_))));

        let no_image = UploadRequest {
            user_id: "user-1".into(),
            text: Some("a shirt".into()),
            ..Default::default()
        };
        assert!(matches!(service.upload(no_image).await, Err(WardrobeError::Validation(_))));

        let unknown_onboarding = UploadRequest {
            onboarding_session_id: Some(SessionId::new()),
            ..upload(InputType::SingleItem, png_b64(5))
        };
        assert!(matches!(
            service.upload(unknown_onboarding).await,
            Err(WardrobeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_onboarding_linkage() {
        let model = ScriptedVision::replying(&[
            r#"{"items": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}"#,
            r#"{"items": [{"name": "d"}, {"name": "e"}]}"#,
        ]);
        let service = service(model, Arc::new(MemoryStore::new()));
        let onboarding = service.onboarding().create("user-1", None).await.unwrap();

        let mut request = upload(InputType::MultiItem, png_b64(6));
        request.onboarding_session_id = Some(onboarding.id);
        let first = service.upload(request.clone()).await.unwrap();
        let progress = first.onboarding.unwrap();
        assert_eq!(progress.total_items, 3);
        assert!(!progress.can_proceed);
        assert_eq!(first.items[0].source, IntakeSource::Onboarding);

        request.image = Some(png_b64(7));
        let second = service.upload(request.clone()).await.unwrap();
        let progress = second.onboarding.unwrap();
        assert_eq!(progress.total_items, 5);
        assert!(progress.can_proceed);

        // Re-uploading reports progress without counting the items again
        let again = service.upload(request).await.unwrap();
        assert!(again.duplicate);
        let progress = again.onboarding.unwrap();
        assert_eq!(progress.total_items, 5);
        assert_eq!(progress.item_ids.len(), 5);
    }

    #[tokio::test]
    async fn test_analyze_only_does_not_persist() {
        let model = ScriptedVision::replying(&[OUTFIT]);
        let store: Arc<dyn WardrobeStore> = Arc::new(MemoryStore::new());
        let service = service(model, store.clone());

        let output = service
            .analyze_only(AnalyzeRequest {
                analysis_type: AnalysisType::MultiItem,
                image: Some(png_b64(8)),
                ..Default::default()
            })
            .await
            .unwrap();

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["analysis_type"], "multi_item");
        assert_eq!(json["result"]["items"].as_array().unwrap().len(), 2);
        assert!(store.list_items("user-1", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_analysis_type_from_str() {
        assert_eq!("multi-item".parse::<AnalysisType>().unwrap(), AnalysisType::MultiItem);
        assert_eq!("Detailed".parse::<AnalysisType>().unwrap(), AnalysisType::Detailed);
        assert!("everything".parse::<AnalysisType>().is_err());
    }
}
