//! Labor Charts - Argentine Employment Distribution Viewer
//!
//! Loads private-sector job posts by province and economic activity, and
//! shows provincial, national and yearly charts.

mod charts;
mod config;
mod data;
mod gui;

use anyhow::Context;
use config::AppConfig;
use eframe::egui;
use gui::LaborChartsApp;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::discover().context("reading configuration")?;
    log::info!(
        "Datasets: {} and {}",
        config.jobs_path().display(),
        config.codes_path().display()
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 780.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Empleo en Argentina"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Labor Charts",
        options,
        Box::new(move |cc| Ok(Box::new(LaborChartsApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
