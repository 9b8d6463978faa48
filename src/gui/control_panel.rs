//! Control Panel Widget
//! Left side panel with dataset selection, view buttons and status.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Left side control panel.
pub struct ControlPanel {
    pub dataset_dir: PathBuf,
    pub progress: f32,
    pub status: String,
    pub charts_ready: bool,
}

impl ControlPanel {
    pub fn new(dataset_dir: PathBuf) -> Self {
        Self {
            dataset_dir,
            progress: 0.0,
            status: "Listo".to_string(),
            charts_ready: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 Empleo en Argentina")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Puestos de trabajo privados")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Dataset Section =====
        ui.label(RichText::new("📁 Datasets").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(self.dataset_dir.display().to_string())
                            .size(12.0)
                            .color(Color32::WHITE),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseDatasets;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Views Section =====
        ui.label(RichText::new("📈 Vistas").size(14.0).strong());
        ui.add_space(8.0);

        ui.add_enabled_ui(self.charts_ready, |ui| {
            ui.vertical_centered(|ui| {
                let national = egui::Button::new(RichText::new("Ver distribución nacional").size(14.0))
                    .min_size(egui::vec2(220.0, 30.0));
                if ui.add(national).clicked() {
                    action = ControlPanelAction::ShowNational;
                }

                ui.add_space(5.0);

                let lines = egui::Button::new(RichText::new("Ver gráfico de líneas").size(14.0))
                    .min_size(egui::vec2(220.0, 30.0));
                if ui.add(lines).clicked() {
                    action = ControlPanelAction::ShowYearly;
                }

                ui.add_space(10.0);

                let export = egui::Button::new(RichText::new("🖼 Exportar PNG").size(14.0))
                    .min_size(egui::vec2(220.0, 30.0));
                if ui.add(export).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progreso").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseDatasets,
    ShowNational,
    ShowYearly,
    ExportPng,
}
