//! chargepanel - charge manager panel, headless shell
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use chargepanel_app::config::{self, PushKind};

/// Charge manager panel: live status, configuration and available current
#[derive(Parser, Debug)]
#[command(name = "chargepanel")]
#[command(about = "Charge manager panel with NDJSON output", long_about = None)]
struct Args {
    /// Base URL of the device (overrides the config file)
    #[arg(long, value_name = "URL")]
    device: Option<String>,

    /// Settings file (default: <config dir>/chargepanel/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Push feed to use: event_stream or websocket
    #[arg(long, value_name = "KIND")]
    push: Option<PushKind>,

    /// Directory for log files (default: <data dir>/chargepanel/logs)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // Logs go to a file; stdout belongs to the NDJSON stream
    chargepanel_core::logging::init(args.log_dir.as_deref())?;

    let mut settings = config::load_settings(args.config.as_deref());
    if let Some(device) = args.device {
        settings.device.url = device;
    }
    if let Some(push) = args.push {
        settings.device.push = push;
    }

    let result = chargepanel::run_headless(settings).await;
    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
        chargepanel::headless::HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
    }

    info!("chargepanel exiting");
    Ok(result?)
}
