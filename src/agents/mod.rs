//! Analysis agents
//!
//! Each agent owns one prompt and one reply shape:
//! - **GarmentAnalyzer**: identifies a single garment
//! - **DetailAnalyzer**: construction details and embellishments
//! - **StyleAnalyst**: styles, occasions and pairings
//! - **ReceiptAnalyzer**: purchased items and prices from a receipt
//! - **MultiItemDetector**: every garment in an outfit photo
//!
//! # Example
//!
//! ```ignore
//! use wardrobe_core::agents::GarmentAnalyzer;
//!
//! let analyzer = GarmentAnalyzer::new(model);
//! let garment = analyzer.analyze(&image).await?;
//! ```

pub mod detail;
pub mod garment;
pub mod multi_item;
pub mod prompts;
pub mod receipt;
pub mod style;

pub use detail::{DetailAnalysis, DetailAnalyzer};
pub use garment::{GarmentAnalysis, GarmentAnalyzer};
pub use multi_item::{DetectedItem, MultiItemDetection, MultiItemDetector};
pub use receipt::{ReceiptAnalysis, ReceiptAnalyzer, ReceiptLineItem};
pub use style::{StyleAnalysis, StyleAnalyst};

use serde_json::{Map, Value};

use crate::analysis::json::extract_object;
use crate::error::Result;
use crate::services::{ImageInput, VisionModel};

/// Ask the model and recover a JSON object from its reply
pub(crate) async fn request_object(
    model: &dyn VisionModel,
    prompt: &str,
    image: Option<&ImageInput>,
) -> Result<Map<String, Value>> {
    let reply = model.complete(prompt, image).await?;
    extract_object(&reply)
}
