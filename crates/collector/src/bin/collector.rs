//! crates/collector/src/bin/collector.rs
//!
//! Command-line driver for the collector: reads an open-tab listing (a JSON
//! array of `{url, title?, favIconUrl?, active?}` objects), plans a capture
//! batch, and submits it.

use clap::{Parser, ValueEnum};
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collector::error::CollectorError;
use collector::filter::{CaptureMode, OpenTab};
use collector::settings::Settings;
use collector::Collector;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Capture every eligible open tab.
    All,
    /// Capture only the active tab.
    Current,
}

impl From<Mode> for CaptureMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => CaptureMode::All,
            Mode::Current => CaptureMode::Current,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "collector", about = "Submit open tabs to the Tabs Declutter API")]
struct Args {
    /// Which tabs to include in the batch.
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Path to the open-tab listing, or '-' to read it from stdin.
    #[arg(long, default_value = "-")]
    tabs: String,
}

fn read_tab_listing(path: &str) -> Result<Vec<OpenTab>, CollectorError> {
    let text = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("info"),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Capture failed: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CollectorError> {
    let settings = Settings::from_env()?;
    let tabs = read_tab_listing(&args.tabs)?;
    let mut collector = Collector::new(settings);

    let response = collector.capture(args.mode.into(), &tabs).await?;

    // Partial success and total success read differently: the per-item
    // errors are listed, never hidden behind the captured count.
    println!(
        "Captured {} tab(s) into session {}",
        response.tabs_captured, response.session_id
    );
    if let Some(errors) = &response.errors {
        println!("{} tab(s) failed:", errors.len());
        for item in errors {
            println!("  {}: {}", item.url, item.error);
        }
    }

    Ok(())
}
