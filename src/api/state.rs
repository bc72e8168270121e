//! Shared handler state

use std::sync::Arc;

use crate::config::{StorageKind, VisionProvider, WardrobeConfig};
use crate::intake::IntakeService;
use crate::onboarding::OnboardingRegistry;
use crate::services::VisionModel;
use crate::storage::WardrobeStore;

/// Everything a handler needs, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    intake: Arc<IntakeService>,
    provider: VisionProvider,
    model_name: String,
}

impl AppState {
    pub fn new(
        config: &WardrobeConfig,
        model: Arc<dyn VisionModel>,
        store: Arc<dyn WardrobeStore>,
        onboarding: OnboardingRegistry,
    ) -> Self {
        let provider = model.provider();
        let model_name = model.model_name().to_string();
        Self {
            intake: Arc::new(IntakeService::new(
                model,
                store,
                onboarding,
                &config.settings.analysis,
            )),
            provider,
            model_name,
        }
    }

    pub fn intake(&self) -> &IntakeService {
        &self.intake
    }

    pub fn store(&self) -> &Arc<dyn WardrobeStore> {
        self.intake.store()
    }

    pub fn onboarding(&self) -> &OnboardingRegistry {
        self.intake.onboarding()
    }

    pub fn provider(&self) -> VisionProvider {
        self.provider
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn store_backend(&self) -> StorageKind {
        self.store().backend()
    }
}
