//! Post-processing of model replies
//!
//! Provides:
//! - JSON recovery from fenced or prose-wrapped replies
//! - Keyword detection against the fashion vocabulary
//! - Heuristic confidence scoring
//! - Receipt price parsing

pub mod confidence;
pub mod json;
pub mod keywords;
pub mod price;

pub use confidence::{blend_with_model, mean_confidence, ConfidenceScore, Signal, CONFIDENCE_CEILING};
pub use json::{extract_json, extract_object, strip_code_fences};
pub use keywords::{detect_embellishments, extract_attributes, AttributeMatches, EmbellishmentReport};
pub use price::{parse_price, scan_receipt_lines, PriceLine, ScannedReceipt};
