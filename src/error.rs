//! Error types for the wardrobe service
//!
//! This module provides structured error definitions using thiserror and a
//! crate-wide `Result` alias. Errors carry enough shape for the API layer to
//! pick a status code and for the vision clients to decide whether a retry
//! is worth it.

use thiserror::Error;

/// Main error type for wardrobe operations
#[derive(Error, Debug)]
pub enum WardrobeError {
    /// LLM API request failed
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Upstream returned a server error (5xx)
    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Network failure talking to an external service
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded on an external service
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Authentication against an external service failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The model answered, but not with anything we can parse
    #[error("Malformed model output: {0}")]
    ModelOutput(String),

    /// Input validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid state transition (e.g., completing a finished session)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid identifier format
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl WardrobeError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WardrobeError::Network(_)
                | WardrobeError::RateLimitExceeded(_)
                | WardrobeError::Upstream { .. }
        )
    }

    /// Short machine-readable kind, used as the `error` field of API responses
    pub fn kind(&self) -> &'static str {
        match self {
            WardrobeError::LlmApi(_) => "llm_api",
            WardrobeError::Upstream { .. } => "upstream",
            WardrobeError::Network(_) => "network",
            WardrobeError::RateLimitExceeded(_) => "rate_limited",
            WardrobeError::Authentication(_) => "authentication",
            WardrobeError::ModelOutput(_) => "model_output",
            WardrobeError::Validation(_) => "validation",
            WardrobeError::NotFound(_) => "not_found",
            WardrobeError::Database(_) => "database",
            WardrobeError::InvalidOperation(_) => "invalid_operation",
            WardrobeError::Config(_) => "config",
            WardrobeError::Io(_) => "io",
            WardrobeError::Serialization(_) => "serialization",
            WardrobeError::InvalidId(_) => "invalid_id",
            WardrobeError::Other(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for WardrobeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            WardrobeError::Network(err.to_string())
        } else if err.is_decode() {
            WardrobeError::ModelOutput(err.to_string())
        } else {
            WardrobeError::LlmApi(err.to_string())
        }
    }
}

/// Convert anyhow::Error to WardrobeError
impl From<anyhow::Error> for WardrobeError {
    fn from(err: anyhow::Error) -> Self {
        WardrobeError::Other(err.to_string())
    }
}

/// Result type alias for wardrobe operations
pub type Result<T> = std::result::Result<T, WardrobeError>;
