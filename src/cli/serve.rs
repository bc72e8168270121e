//! HTTP API server command

use tracing::debug;
use wardrobe_core::{api::ApiServer, error::Result, WardrobeConfig};

/// Handle API server startup command
pub async fn handle(mut config: WardrobeConfig, addr: Option<String>) -> Result<()> {
    if let Some(addr) = addr {
        config.settings.server.addr = addr;
    }
    debug!("Starting HTTP API server on {}...", config.settings.server.addr);

    let server = ApiServer::from_config(&config)?;

    println!();
    println!("Wardrobe API Server");
    println!();
    println!("   Address: http://{}", config.settings.server.addr);
    println!("   Vision:  {}", server.state().model_name());
    println!("   Store:   {}", server.state().store_backend());
    println!();
    println!("   Endpoints:");
    println!("   - POST /api/analyze - Analyze an image without saving");
    println!("   - POST /api/upload - Analyze and catalog an upload");
    println!("   - POST /api/multi-item-upload - Catalog every item in a photo");
    println!("   - GET  /api/items?user_id= - List cataloged items");
    println!("   - GET  /api/sessions/:id - Detection session status");
    println!("   - POST /api/onboarding - Start onboarding");
    println!("   - GET  /health - Health check");
    println!();

    server.serve().await?;
    Ok(())
}
