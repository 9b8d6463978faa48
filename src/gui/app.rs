//! Labor Charts Main Application
//! Main window with control panel and chart viewer.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{DataLoader, DataProcessor, EmploymentSummary};
use crate::gui::{ChartView, ChartViewer, ControlPanel, ControlPanelAction};
use anyhow::Context;
use egui::SidePanel;
use log::{error, info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

/// Dataset loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(EmploymentSummary),
    Error(String),
}

/// Main application window.
pub struct LaborChartsApp {
    config: AppConfig,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl LaborChartsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.dataset_dir.clone()),
            chart_viewer: ChartViewer::new(config.label_wrap),
            config,
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Load and aggregate the datasets in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        self.chart_viewer.clear();
        self.control_panel.charts_ready = false;
        self.control_panel.dataset_dir = self.config.dataset_dir.clone();
        self.control_panel.set_progress(0.0, "Leyendo datasets...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || match Self::run_pipeline(&tx, &config) {
            Ok(summary) => {
                let _ = tx.send(LoadResult::Complete(summary));
            }
            Err(e) => {
                error!("Loading failed: {:#}", e);
                let _ = tx.send(LoadResult::Error(format!("{:#}", e)));
            }
        });
    }

    /// Load → join → aggregate (called from background thread)
    fn run_pipeline(
        tx: &Sender<LoadResult>,
        config: &AppConfig,
    ) -> anyhow::Result<EmploymentSummary> {
        let jobs_path = config.jobs_path();
        let codes_path = config.codes_path();

        let _ = tx.send(LoadResult::Progress(10.0, "Leyendo puestos de trabajo...".to_string()));
        let jobs = DataLoader::load_jobs(&jobs_path)
            .with_context(|| format!("loading {}", jobs_path.display()))?;

        let _ = tx.send(LoadResult::Progress(40.0, "Leyendo códigos de actividad...".to_string()));
        let codes = DataLoader::load_codes(&codes_path)
            .with_context(|| format!("loading {}", codes_path.display()))?;

        let _ = tx.send(LoadResult::Progress(55.0, "Uniendo tablas...".to_string()));
        let records = DataProcessor::merge(&jobs, &codes).context("joining job records")?;

        let _ = tx.send(LoadResult::Progress(75.0, "Calculando totales...".to_string()));
        let summary = DataProcessor::summarize(&records, config)?;

        info!(
            "Loaded {} records, {} provinces for {}",
            summary.record_count,
            summary.breakdowns.len(),
            summary.year
        );
        Ok(summary)
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(summary) => {
                        let status = format!(
                            "{} registros, {} provincias ({})",
                            summary.record_count,
                            summary.breakdowns.len(),
                            summary.year
                        );
                        self.chart_viewer.set_summary(summary);
                        self.control_panel.charts_ready = true;
                        self.control_panel.set_progress(100.0, &status);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Handle dataset folder selection
    fn handle_browse_datasets(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.dataset_dir)
            .pick_folder()
        {
            info!("Dataset directory changed to {}", dir.display());
            self.config.dataset_dir = dir;
            self.start_loading();
        }
    }

    /// Handle PNG export of the active chart
    fn handle_export_png(&mut self) {
        let Some(summary) = &self.chart_viewer.summary else {
            self.control_panel.set_progress(0.0, "No hay gráficos para exportar");
            return;
        };

        let view = self.chart_viewer.active_view();
        let file_name = match view {
            ChartView::Provincial => summary
                .breakdowns
                .get(self.chart_viewer.pager.index())
                .map(|b| format!("empleo_{}_{}.png", b.province, summary.year))
                .unwrap_or_else(|| "empleo_provincia.png".to_string()),
            ChartView::National => format!("empleo_nacional_{}.png", summary.year),
            ChartView::Yearly => "empleo_por_anio.png".to_string(),
        };

        // Ask user for output location
        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(&file_name)
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        let label_wrap = self.chart_viewer.label_wrap();
        let result = match view {
            ChartView::Provincial => match summary.breakdowns.get(self.chart_viewer.pager.index()) {
                Some(breakdown) => {
                    StaticChartRenderer::render_breakdown(breakdown, label_wrap, &output_path)
                }
                None => return,
            },
            ChartView::National => {
                StaticChartRenderer::render_national(&summary.national, label_wrap, &output_path)
            }
            ChartView::Yearly => StaticChartRenderer::render_yearly(&summary.yearly, &output_path),
        };

        match result {
            Ok(()) => {
                info!("Exported {:?} chart to {}", view, output_path.display());
                self.control_panel.set_progress(
                    100.0,
                    &format!("PNG exportado: {}", output_path.display()),
                );
                if let Err(e) = open::that(&output_path) {
                    warn!("Could not open {}: {}", output_path.display(), e);
                }
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for LaborChartsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseDatasets => self.handle_browse_datasets(),
                        ControlPanelAction::ShowNational => self.chart_viewer.open_national(),
                        ControlPanelAction::ShowYearly => self.chart_viewer.open_yearly(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ctx, ui);
        });
    }
}
