//! Wardrobe - vision-LLM garment cataloging
//!
//! A Rust service that turns photos of clothing, outfits and receipts into
//! structured wardrobe items:
//! - Multi-pass garment analysis (identify, detail, style) via Claude or Gemini
//! - Multi-item detection for outfit and flat-lay photos
//! - Receipt reading with a line-scanning fallback
//! - Vocabulary enrichment and heuristic confidence scoring
//! - Duplicate-aware detection sessions persisted to Supabase
//! - Guided onboarding progress
//!
//! # Architecture
//!
//! The system is organized into several layers:
//! - **Types / Vocabulary / Analysis**: data model, fashion lexicons, pure
//!   parsing and scoring helpers
//! - **Services**: vision model clients and image payloads
//! - **Agents / Orchestration**: prompt-building analyzers and the
//!   multi-pass merge
//! - **Storage**: item and detection session persistence
//! - **Intake / API**: the upload pipeline and its HTTP surface
//!
//! # Example
//!
//! ```ignore
//! use wardrobe_core::{api::ApiServer, WardrobeConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = WardrobeConfig::load(None)?;
//!     ApiServer::from_config(&config)?.serve().await
//! }
//! ```

pub mod agents;
pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod intake;
pub mod onboarding;
pub mod orchestration;
pub mod services;
pub mod storage;
pub mod types;
pub mod vocabulary;

// Re-export commonly used types
pub use config::{StorageKind, VisionProvider, WardrobeConfig};
pub use error::{Result, WardrobeError};
pub use intake::{AnalysisType, InputType, IntakeService, UploadRequest, UploadResponse};
pub use onboarding::{OnboardingRegistry, OnboardingSession};
pub use orchestration::{AnalysisReport, MultiPassAnalyzer};
pub use services::{ImageInput, VisionModel};
pub use storage::{DetectionStart, MemoryStore, WardrobeStore};
pub use types::{
    Category, Currency, DetectionSession, DetectionStatus, IntakeSource, ItemId, Money, SessionId,
    WardrobeItem,
};
