mod api;
mod controller;
mod history;
mod logging;
mod models;
mod pages;
mod pagination;
mod session;
mod settings;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::api::ApiClient;
use crate::history::WatchHistory;
use crate::session::Session;
use crate::settings::AppSettings;

fn main() {
    if let Err(e) = run() {
        tracing::error!("{e:#}");
        eprintln!("failed to start app: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    logging::init(logging::DEFAULT_LOG_LEVEL)?;

    let settings = AppSettings::load();
    let config_dir = settings::config_dir().unwrap_or_else(|| PathBuf::from("."));
    let session = Arc::new(Session::load(config_dir.join("session.json")));
    let history = WatchHistory::new(config_dir.join("history.json"));
    let api = ApiClient::new(&settings.api_base_url, settings.timeout(), session.clone())
        .context("build http client")?;
    let rt = Arc::new(tokio::runtime::Runtime::new().context("tokio runtime")?);
    tracing::info!(base_url = %settings.api_base_url, "starting");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Anistream",
        native_options,
        Box::new(move |cc| {
            Box::new(ui::AnistreamApp::new(cc, rt, settings, session, history, api))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}
