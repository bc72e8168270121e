//! One-off image analysis command

use std::path::PathBuf;
use tracing::debug;
use wardrobe_core::{
    error::Result,
    intake::{AnalysisType, AnalyzeRequest, IntakeService},
    onboarding::OnboardingRegistry,
    services::{vision_from_config, ImageInput},
    storage::MemoryStore,
    WardrobeConfig,
};

/// Build an intake service that never persists anything
pub(crate) fn offline_intake(config: &WardrobeConfig) -> Result<IntakeService> {
    Ok(IntakeService::new(
        vision_from_config(config)?,
        std::sync::Arc::new(MemoryStore::new()),
        OnboardingRegistry::new(&config.settings.onboarding),
        &config.settings.analysis,
    ))
}

/// Handle the analyze command: print the analyzer's JSON to stdout
pub async fn handle(config: WardrobeConfig, path: PathBuf, analysis_type: AnalysisType) -> Result<()> {
    let image = ImageInput::from_path(&path).await?;
    debug!(
        "Analyzing {} ({}, {} bytes) as {:?}",
        path.display(),
        image.media_type(),
        image.byte_len(),
        analysis_type
    );

    let intake = offline_intake(&config)?;
    let output = intake
        .analyze_only(AnalyzeRequest {
            analysis_type,
            image: Some(image.data().to_string()),
            media_type: Some(image.media_type().to_string()),
            text: None,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
