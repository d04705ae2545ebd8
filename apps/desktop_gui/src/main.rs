use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use transfer_client::{load_settings, HttpStyleTransferClient, SettingsOverrides};

mod backend_bridge;
mod controller;
mod media;
mod ui;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::ImagiNetApp;

#[derive(Parser, Debug)]
#[command(name = "imaginet-desktop", about = "Desktop client for the ImagiNet style-transfer service")]
struct Args {
    /// Base url of the style-transfer service.
    #[arg(long)]
    endpoint: Option<String>,
    /// Path to an imaginet.toml config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = load_settings(&SettingsOverrides {
        config_path: args.config,
        endpoint: args.endpoint,
    })
    .context("failed to load settings")?;
    let client = HttpStyleTransferClient::from_settings(&settings)
        .context("failed to prepare the style-transfer client")?;
    tracing::info!(
        url = %client.transfer_url(),
        styles = settings.styles.len(),
        "starting desktop gui"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, Arc::new(client));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ImagiNet")
            .with_inner_size([1024.0, 860.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "ImagiNet",
        options,
        Box::new(move |_cc| Ok(Box::new(ImagiNetApp::new(cmd_tx, ui_rx, settings)))),
    )
    .map_err(|err| anyhow!("desktop gui exited with an error: {err}"))
}
