mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::Context;
use app::CovidTrackerApp;
use config::AppConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let cli_path = std::env::args().nth(1).map(PathBuf::from);
    let state = match load_startup_state(cli_path, AppConfig::load()) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "COVID-19 Global Tracker",
        options,
        Box::new(|_cc| Ok(Box::new(CovidTrackerApp::new(state)))),
    )
}

/// Whether the startup source was explicitly requested (a CLI argument or a
/// configured non-default path) rather than the built-in default file.
fn explicit_source(cli_path: Option<&PathBuf>, config: &AppConfig) -> bool {
    cli_path.is_some() || config.data_path != Path::new(config::DEFAULT_DATA_PATH)
}

/// Resolve the startup source and preload it. An explicitly requested source
/// must load: any failure there, a missing file included, aborts startup and
/// no partial dashboard appears. Only the built-in default file may be
/// absent, which starts the app empty with a File → Open hint in the status
/// bar.
fn load_startup_state(cli_path: Option<PathBuf>, config: AppConfig) -> anyhow::Result<AppState> {
    let required = explicit_source(cli_path.as_ref(), &config);
    let data_path = cli_path.unwrap_or_else(|| config.data_path.clone());

    let mut state = AppState::new(config);
    if required || data_path.exists() {
        state
            .load_path(data_path.clone())
            .with_context(|| format!("loading {}", data_path.display()))?;
    } else {
        log::warn!(
            "{}: not found, starting without data (use File → Open…)",
            data_path.display()
        );
        state.status_message = Some(format!(
            "{}: not found (use File → Open…)",
            data_path.display()
        ));
    }
    Ok(state)
}
