//! HTTP API server

use super::{handlers::*, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::config::WardrobeConfig;
use crate::error::{Result, WardrobeError};
use crate::onboarding::OnboardingRegistry;
use crate::services::vision_from_config;
use crate::storage::store_from_config;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
    /// How often idle onboarding sessions are swept
    pub eviction_interval: Duration,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
            eviction_interval: Duration::from_secs(300),
        }
    }
}

impl ApiServerConfig {
    pub fn from_config(config: &WardrobeConfig) -> Result<Self> {
        let addr = config
            .settings
            .server
            .addr
            .parse()
            .map_err(|e| WardrobeError::Validation(format!("invalid server address: {}", e)))?;
        Ok(Self {
            addr,
            eviction_interval: Duration::from_secs(
                config.settings.onboarding.eviction_interval_secs.max(1),
            ),
        })
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    /// Eviction task handle for cleanup
    eviction_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            eviction_handle: None,
        }
    }

    /// Wire the vision model, store and onboarding registry from configuration
    pub fn from_config(config: &WardrobeConfig) -> Result<Self> {
        let model = vision_from_config(config)?;
        let store = store_from_config(config)?;
        let onboarding = OnboardingRegistry::new(&config.settings.onboarding);
        let state = AppState::new(config, model, store, onboarding);
        Ok(Self::new(ApiServerConfig::from_config(config)?, state))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build router
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            // Analysis and intake
            .route("/api/analyze", post(analyze_handler))
            .route("/api/upload", post(upload_handler))
            .route("/api/multi-item-upload", post(multi_item_upload_handler))
            // Catalog
            .route("/api/items", get(list_items_handler))
            .route("/api/items/:id", get(get_item_handler).delete(delete_item_handler))
            .route("/api/sessions/:id", get(get_session_handler))
            // Onboarding
            .route("/api/onboarding", post(create_onboarding_handler))
            .route("/api/onboarding/:id", get(get_onboarding_handler))
            .route("/api/onboarding/:id/items", post(add_onboarding_items_handler))
            // Health check
            .route("/health", get(health_handler))
            // State
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until ctrl-c
    pub async fn serve(mut self) -> anyhow::Result<()> {
        let router = Self::build_router(self.state.clone());

        self.eviction_handle = Some(
            self.state
                .onboarding()
                .spawn_eviction(self.config.eviction_interval),
        );

        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!(
            "Wardrobe API listening on http://{} ({} via {}, {} store)",
            listener.local_addr()?,
            self.state.model_name(),
            self.state.provider(),
            self.state.store_backend()
        );

        tokio::select! {
            result = axum::serve(listener, router) => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received ctrl-c, shutting down");
            }
        }
        Ok(())
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        if let Some(handle) = self.eviction_handle.take() {
            handle.abort();
            debug!("ApiServer dropped - eviction task aborted");
        }
    }
}
