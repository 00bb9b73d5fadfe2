#[macro_use]
pub mod utils;

pub mod audio;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod decoder;
pub mod error;
pub mod models;
pub mod scanner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

pub use classifier::classify;
pub use config::SessionConfig;
pub use error::{DecodeError, MediaError, ScanError};
pub use models::{ContentType, DetectionResult, ScanHistoryEntry};
pub use scanner::{ScanSessionController, ScanState, ScannerSnapshot};

use capture::NoMediaDevices;
use decoder::RqrrDecoder;

#[derive(Parser)]
#[command(name = "qrscan", version, about = "Scan QR codes from images and classify payloads")]
struct Cli {
    /// Session config (JSON). Missing fields use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the content type of a payload
    Classify { text: String },
    /// Decode the first QR code in an image file, file:// or data: URL
    Scan { source: String },
}

fn debug_enabled() -> bool {
    std::env::var("QRSCAN_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn run() -> Result<()> {
    let default_level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Classify { text } => {
            println!("{}", classify(&text));
            Ok(())
        }
        Command::Scan { source } => {
            let config = match &cli.config {
                Some(path) => SessionConfig::load(path)?,
                None => SessionConfig::default(),
            };
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(scan_command(&source, config))
        }
    }
}

async fn scan_command(source: &str, config: SessionConfig) -> Result<()> {
    let controller = ScanSessionController::new(
        Arc::new(NoMediaDevices),
        Arc::new(RqrrDecoder::new()),
        config,
    );

    let result = controller
        .scan_image_from_url(source)
        .await
        .with_context(|| format!("Failed to scan {source}"))?;

    match result {
        Some(result) => {
            log::info!("found {} code in {source}", result.content_type);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        None => {
            log::info!("no QR code found in {source}");
            println!("null");
        }
    }
    Ok(())
}
