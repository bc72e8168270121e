//! Core data types for the wardrobe service
//!
//! Wardrobe items, detection sessions and money amounts. These records are
//! what the analyzers produce, what the store persists and what the API
//! returns, so every type here round-trips through serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, WardrobeError};

/// Unique identifier for wardrobe items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an item ID from a string
    pub fn from_string(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for detection and onboarding sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Garment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tops,
    Bottoms,
    Dresses,
    Outerwear,
    Shoes,
    Bags,
    Accessories,
    Jewelry,
    Activewear,
    Swimwear,
    Loungewear,
    Underwear,
    Other,
}

impl Category {
    /// Lenient parse of a model-supplied category label
    ///
    /// Accepts canonical names, singular forms and common garment words.
    /// Anything unrecognised maps to `Other`.
    pub fn parse_lenient(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "tops" | "top" | "shirt" | "shirts" | "t shirt" | "tee" | "blouse" | "sweater"
            | "knitwear" | "cardigan" | "hoodie" | "tank" | "tank top" | "polo" => Category::Tops,
            "bottoms" | "bottom" | "pants" | "trousers" | "jeans" | "skirt" | "skirts"
            | "shorts" | "leggings" => Category::Bottoms,
            "dresses" | "dress" | "gown" | "jumpsuit" | "romper" => Category::Dresses,
            "outerwear" | "coat" | "coats" | "jacket" | "jackets" | "blazer" | "parka"
            | "trench" | "vest" => Category::Outerwear,
            "shoes" | "shoe" | "footwear" | "sneakers" | "boots" | "heels" | "sandals"
            | "loafers" | "flats" => Category::Shoes,
            "bags" | "bag" | "handbag" | "handbags" | "purse" | "tote" | "backpack"
            | "clutch" => Category::Bags,
            "accessories" | "accessory" | "belt" | "scarf" | "hat" | "sunglasses" | "gloves"
            | "tie" => Category::Accessories,
            "jewelry" | "jewellery" | "necklace" | "ring" | "earrings" | "bracelet"
            | "watch" => Category::Jewelry,
            "activewear" | "sportswear" | "athletic" | "athleisure" => Category::Activewear,
            "swimwear" | "swimsuit" | "bikini" => Category::Swimwear,
            "loungewear" | "sleepwear" | "pajamas" | "pyjamas" => Category::Loungewear,
            "underwear" | "lingerie" | "intimates" | "socks" => Category::Underwear,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Tops => "tops",
            Category::Bottoms => "bottoms",
            Category::Dresses => "dresses",
            Category::Outerwear => "outerwear",
            Category::Shoes => "shoes",
            Category::Bags => "bags",
            Category::Accessories => "accessories",
            Category::Jewelry => "jewelry",
            Category::Activewear => "activewear",
            Category::Swimwear => "swimwear",
            Category::Loungewear => "loungewear",
            Category::Underwear => "underwear",
            Category::Other => "other",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an item entered the wardrobe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeSource {
    SingleItem,
    MultiItem,
    Receipt,
    Outfit,
    Onboarding,
    Manual,
}

impl std::fmt::Display for IntakeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntakeSource::SingleItem => "single_item",
            IntakeSource::MultiItem => "multi_item",
            IntakeSource::Receipt => "receipt",
            IntakeSource::Outfit => "outfit",
            IntakeSource::Onboarding => "onboarding",
            IntakeSource::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// ISO currency codes the price parser recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
    Chf,
}

impl Currency {
    /// Parse an ISO code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            "JPY" => Some(Currency::Jpy),
            "CAD" => Some(Currency::Cad),
            "AUD" => Some(Currency::Aud),
            "CHF" => Some(Currency::Chf),
            _ => None,
        }
    }

    /// Map a currency symbol. `$` is read as USD.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '$' => Some(Currency::Usd),
            '€' => Some(Currency::Eur),
            '£' => Some(Currency::Gbp),
            '¥' => Some(Currency::Jpy),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
        }
    }
}

/// A money amount as a fixed-point count of hundredths of the major unit
///
/// The scale is 100 for every currency, including ones without a minor
/// unit: ¥1,200 is stored as `120000`. `amount_minor` is therefore not the
/// ISO 4217 minor-unit amount for JPY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
}

impl Money {
    pub fn new(amount_minor: i64, currency: Option<Currency>) -> Self {
        Self {
            amount_minor,
            currency,
        }
    }

    /// Build from a major-unit float, rounding to the nearest minor unit
    pub fn from_major(amount: f64, currency: Option<Currency>) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Some(Self::new((amount * 100.0).round() as i64, currency))
    }

    /// Amount in major units
    pub fn major(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)?;
        if let Some(currency) = self.currency {
            write!(f, " {}", currency.code())?;
        }
        Ok(())
    }
}

/// A cataloged garment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub id: ItemId,
    pub user_id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub fabrics: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub embellishments: Vec<String>,
    #[serde(default)]
    pub price: Option<Money>,
    pub confidence_score: f32,
    pub needs_review: bool,
    pub source: IntakeSource,
    #[serde(default)]
    pub detection_session_id: Option<SessionId>,
    /// Raw model output this item was built from
    #[serde(default)]
    pub raw_analysis: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl WardrobeItem {
    /// Create an item with the confidence clamped into `[0, 1]` and the
    /// review flag derived from `review_threshold`
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        confidence: f32,
        review_threshold: f32,
        source: IntakeSource,
    ) -> Self {
        let confidence_score = clamp_confidence(confidence);
        Self {
            id: ItemId::new(),
            user_id: user_id.into(),
            name: name.into(),
            category,
            subcategory: None,
            brand: None,
            colors: Vec::new(),
            fabrics: Vec::new(),
            patterns: Vec::new(),
            styles: Vec::new(),
            embellishments: Vec::new(),
            price: None,
            confidence_score,
            needs_review: confidence_score < review_threshold,
            source,
            detection_session_id: None,
            raw_analysis: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// Clamp a confidence value into `[0, 1]`; NaN becomes 0
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Detection session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Processing,
    Completed,
    Failed,
}

/// A per-upload record correlating one source image with extracted items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSession {
    pub id: SessionId,
    pub user_id: String,
    pub image_hash: String,
    pub status: DetectionStatus,
    pub item_count: usize,
    #[serde(default)]
    pub overall_confidence: Option<f32>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DetectionSession {
    /// Start a new session in `processing`
    pub fn start(user_id: impl Into<String>, image_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            image_hash: image_hash.into(),
            status: DetectionStatus::Processing,
            item_count: 0,
            overall_confidence: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to `completed`. Only valid from `processing`.
    pub fn complete(&mut self, item_count: usize, overall_confidence: Option<f32>) -> Result<()> {
        self.ensure_processing()?;
        self.status = DetectionStatus::Completed;
        self.item_count = item_count;
        self.overall_confidence = overall_confidence.map(clamp_confidence);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition to `failed`. Only valid from `processing`.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        self.ensure_processing()?;
        self.status = DetectionStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Whether a new upload of the same image should reuse this session
    pub fn blocks_duplicate(&self) -> bool {
        self.status != DetectionStatus::Failed
    }

    fn ensure_processing(&self) -> Result<()> {
        if self.status != DetectionStatus::Processing {
            return Err(WardrobeError::InvalidOperation(format!(
                "detection session {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}
