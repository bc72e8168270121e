//! HTTP API for uploads, the item catalog and onboarding
//!
//! Provides:
//! - Analysis and upload endpoints backed by [`crate::intake::IntakeService`]
//! - Item and detection session lookups
//! - Onboarding progress

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorBody};
pub use extract::{ApiJson, ApiQuery};
pub use handlers::HealthResponse;
pub use server::{ApiServer, ApiServerConfig};
pub use state::AppState;
