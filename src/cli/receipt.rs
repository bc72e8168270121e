//! Receipt analysis command

use std::path::{Path, PathBuf};
use wardrobe_core::{
    error::Result,
    intake::{AnalysisType, AnalyzeRequest},
    services::{sniff_media_type, ImageInput},
    WardrobeConfig,
};

use super::analyze::offline_intake;

/// Handle the receipt command
///
/// Images are sent to the vision model; anything else is read as text.
pub async fn handle(config: WardrobeConfig, path: PathBuf) -> Result<()> {
    let request = build_request(&path).await?;
    let output = offline_intake(&config)?.analyze_only(request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn build_request(path: &Path) -> Result<AnalyzeRequest> {
    let bytes = tokio::fs::read(path).await?;
    let mut request = AnalyzeRequest {
        analysis_type: AnalysisType::Receipt,
        ..Default::default()
    };

    if sniff_media_type(&bytes).is_some() {
        let image = ImageInput::from_bytes(&bytes, None)?;
        request.image = Some(image.data().to_string());
        request.media_type = Some(image.media_type().to_string());
    } else {
        request.text = Some(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(request)
}
