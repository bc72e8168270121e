//! Configuration display command

use wardrobe_core::{config::default_config_path, error::Result, WardrobeConfig};

/// Print the effective configuration; secrets show only as set or unset
pub async fn handle(config: WardrobeConfig) -> Result<()> {
    match default_config_path() {
        Some(path) if path.exists() => println!("# default file: {}", path.display()),
        Some(path) => println!("# default file: {} (not present)", path.display()),
        None => println!("# no default config directory"),
    }
    println!("{}", serde_json::to_string_pretty(&config.settings)?);
    println!();
    println!("{:#?}", config.credentials);
    Ok(())
}
