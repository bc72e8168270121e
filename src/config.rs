//! Configuration and credential loading for the wardrobe service
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config` or `$XDG_CONFIG_HOME/wardrobe/config.toml`)
//! 3. `WARDROBE__SECTION__KEY` environment variables
//!
//! API keys never come from the file. They are read from the environment
//! and kept behind `secrecy::SecretString`.

use crate::error::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable prefix for layered settings
const ENV_PREFIX: &str = "WARDROBE";

/// Which hosted vision model answers analysis prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionProvider {
    Claude,
    Gemini,
}

impl std::fmt::Display for VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisionProvider::Claude => write!(f, "claude"),
            VisionProvider::Gemini => write!(f, "gemini"),
        }
    }
}

/// Persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Supabase PostgREST tables
    Supabase,
    /// In-process maps (development and tests)
    Memory,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Supabase => write!(f, "supabase"),
            StorageKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub provider: VisionProvider,
    pub claude_model: String,
    pub gemini_model: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Attempts for transient failures (1 = no retry)
    pub max_attempts: usize,
    pub backoff_base_ms: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            provider: VisionProvider::Claude,
            claude_model: "claude-3-5-sonnet-20241022".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
            timeout_secs: 60,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Items scoring below this are flagged `needs_review`
    pub review_threshold: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            review_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingSettings {
    pub target_items: u32,
    pub session_ttl_secs: u64,
    pub eviction_interval_secs: u64,
}

impl Default for OnboardingSettings {
    fn default() -> Self {
        Self {
            target_items: 5,
            session_ttl_secs: 60 * 60 * 24,
            eviction_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageKind,
    pub items_table: String,
    pub sessions_table: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageKind::Memory,
            items_table: "wardrobe_items".to_string(),
            sessions_table: "multi_item_detection_sessions".to_string(),
        }
    }
}

/// Non-secret settings, deserialized from layered sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub vision: VisionSettings,
    pub analysis: AnalysisSettings,
    pub onboarding: OnboardingSettings,
    pub storage: StorageSettings,
}

/// Secrets and endpoints read from the process environment
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<SecretString>,
}

impl Credentials {
    /// Read credentials from the environment
    ///
    /// `SUPABASE_SERVICE_KEY` wins over `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Self {
        let supabase_key = non_empty_var("SUPABASE_SERVICE_KEY").or_else(|| {
            let anon = non_empty_var("SUPABASE_ANON_KEY");
            if anon.is_some() {
                debug!("Using SUPABASE_ANON_KEY; row level security applies to writes");
            }
            anon
        });

        Self {
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY").map(SecretString::from),
            gemini_api_key: non_empty_var("GEMINI_API_KEY").map(SecretString::from),
            supabase_url: non_empty_var("SUPABASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            supabase_key: supabase_key.map(SecretString::from),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &redacted(&self.anthropic_api_key))
            .field("gemini_api_key", &redacted(&self.gemini_api_key))
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &redacted(&self.supabase_key))
            .finish()
    }
}

fn redacted(secret: &Option<SecretString>) -> &'static str {
    match secret {
        Some(s) if !s.expose_secret().is_empty() => "[set]",
        _ => "[unset]",
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Effective configuration: settings plus credentials
#[derive(Debug, Clone, Default)]
pub struct WardrobeConfig {
    pub settings: Settings,
    pub credentials: Credentials,
}

impl WardrobeConfig {
    /// Load settings from defaults, an optional file and the environment
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(p) => {
                debug!("Loading configuration from {}", p.display());
                builder = builder.add_source(config::File::from(p.to_path_buf()).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    if default_path.exists() {
                        debug!("Loading configuration from {}", default_path.display());
                    }
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let config = Self {
            settings,
            credentials: Credentials::from_env(),
        };
        config.warn_missing_credentials();
        Ok(config)
    }

    /// Build from explicit settings, reading credentials from the environment
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            credentials: Credentials::from_env(),
        }
    }

    fn warn_missing_credentials(&self) {
        let vision = &self.settings.vision;
        match vision.provider {
            VisionProvider::Claude if self.credentials.anthropic_api_key.is_none() => {
                warn!("ANTHROPIC_API_KEY not set; analysis requests will fail")
            }
            VisionProvider::Gemini if self.credentials.gemini_api_key.is_none() => {
                warn!("GEMINI_API_KEY not set; analysis requests will fail")
            }
            _ => {}
        }

        if self.settings.storage.backend == StorageKind::Supabase
            && (self.credentials.supabase_url.is_none() || self.credentials.supabase_key.is_none())
        {
            warn!("Supabase storage selected but SUPABASE_URL or key is missing");
        }
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("wardrobe").join("config.toml"))
}
