mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use app::DashboardApp;
use config::{DashboardConfig, CONFIG_FILE};
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = DashboardConfig::load(Path::new(CONFIG_FILE))?;
    log::debug!("Effective config: {}", config.to_json()?);

    // A report that cannot be loaded aborts the run before any window opens.
    let table = data::pipeline::load_conversions(&config.input_path, &config.sheet_spec())
        .with_context(|| format!("loading {}", config.input_path.display()))?;
    let source = config.input_path.clone();
    let state = AppState::new(config, source, table);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        app::PAGE_TITLE,
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
