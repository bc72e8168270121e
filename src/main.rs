//! Wardrobe - garment, outfit and receipt cataloging service
//!
//! This is the main entry point for the `wardrobe` binary: it runs the HTTP
//! API and offers one-off analysis commands for local files.

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};
use wardrobe_core::{error::Result, intake::AnalysisType, WardrobeConfig};

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(about = "Vision-LLM wardrobe cataloging service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Config file (defaults to $XDG_CONFIG_HOME/wardrobe/config.toml)
    #[arg(long, env = "WARDROBE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address (overrides server.addr)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Analyze an image file and print the result as JSON
    Analyze {
        /// Image path
        path: PathBuf,

        /// basic, detailed, style, multipass, multi-item or receipt
        #[arg(short = 't', long = "type", default_value = "multipass")]
        analysis_type: AnalysisType,
    },

    /// Read a receipt image or text file
    Receipt {
        /// Receipt image or text path
        path: PathBuf,
    },

    /// Parse a printed price such as "$1,299.00" or "12,50 €"
    ParsePrice {
        text: String,

        /// Print the amount as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use specified level for our crates, but WARN for noisy HTTP internals
    let filter = EnvFilter::new(format!(
        "wardrobe={level},wardrobe_core={level},tower_http={level},hyper=warn,reqwest=warn,rustls=warn",
        level = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Wardrobe v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WardrobeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { addr } => cli::serve::handle(config, addr).await,
        Commands::Analyze {
            path,
            analysis_type,
        } => cli::analyze::handle(config, path, analysis_type).await,
        Commands::Receipt { path } => cli::receipt::handle(config, path).await,
        Commands::ParsePrice { text, json } => cli::parse_price::handle(text, json).await,
        Commands::Config => cli::config::handle(config).await,
    }
}
