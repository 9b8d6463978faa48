//! Chart Viewer Widget
//! Central panel with the paged provincial chart, plus windows for the
//! national pie and the yearly line.

use crate::charts::ChartPlotter;
use crate::data::EmploymentSummary;
use crate::gui::pager::ProvincePager;
use egui::{RichText, Window};

/// Which chart an export applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    Provincial,
    National,
    Yearly,
}

/// Displays the employment charts and owns the province page index.
pub struct ChartViewer {
    pub summary: Option<EmploymentSummary>,
    pub pager: ProvincePager,
    pub show_national: bool,
    pub show_yearly: bool,
    active_view: ChartView,
    label_wrap: usize,
}

impl ChartViewer {
    pub fn new(label_wrap: usize) -> Self {
        Self {
            summary: None,
            pager: ProvincePager::default(),
            show_national: false,
            show_yearly: false,
            active_view: ChartView::Provincial,
            label_wrap,
        }
    }

    /// Clear all charts
    pub fn clear(&mut self) {
        self.summary = None;
        self.pager = ProvincePager::default();
        self.show_national = false;
        self.show_yearly = false;
        self.active_view = ChartView::Provincial;
    }

    /// Replace the data and go back to the first province.
    pub fn set_summary(&mut self, summary: EmploymentSummary) {
        self.pager = ProvincePager::new(summary.breakdowns.len());
        self.summary = Some(summary);
        self.active_view = ChartView::Provincial;
    }

    pub fn open_national(&mut self) {
        self.show_national = true;
        self.active_view = ChartView::National;
    }

    pub fn open_yearly(&mut self) {
        self.show_yearly = true;
        self.active_view = ChartView::Yearly;
    }

    /// The most recently opened chart that is still visible.
    pub fn active_view(&self) -> ChartView {
        self.active_view
    }

    pub fn label_wrap(&self) -> usize {
        self.label_wrap
    }

    pub fn next_province(&mut self) {
        self.pager.next();
        self.active_view = ChartView::Provincial;
    }

    pub fn prev_province(&mut self) {
        self.pager.prev();
        self.active_view = ChartView::Provincial;
    }

    /// Draw the provincial chart and any open windows.
    pub fn show(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let Some(summary) = &self.summary else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Sin datos").size(20.0));
            });
            return;
        };

        let mut go_prev = false;
        let mut go_next = false;

        if let Some(breakdown) = summary.breakdowns.get(self.pager.index()) {
            ui.vertical(|ui| {
                ChartPlotter::draw_breakdown_chart(ui, breakdown, self.label_wrap);

                ui.horizontal(|ui| {
                    go_prev = ui
                        .add_enabled(self.pager.has_prev(), egui::Button::new("Ant"))
                        .clicked();
                    ui.label(
                        RichText::new(format!(
                            "{} / {} ({})",
                            self.pager.index() + 1,
                            self.pager.len(),
                            summary.year
                        ))
                        .size(13.0),
                    );
                    go_next = ui
                        .add_enabled(self.pager.has_next(), egui::Button::new("Sig"))
                        .clicked();
                });
            });
        }

        Window::new("Distribución nacional")
            .open(&mut self.show_national)
            .default_size([720.0, 560.0])
            .show(ctx, |ui| {
                ChartPlotter::draw_national_pie(ui, &summary.national);
            });

        Window::new("Gráfico de líneas")
            .open(&mut self.show_yearly)
            .default_size([720.0, 480.0])
            .show(ctx, |ui| {
                ChartPlotter::draw_yearly_line(ui, &summary.yearly);
            });

        if go_prev {
            self.prev_province();
        }
        if go_next {
            self.next_province();
        }

        // Closing a window hands exports back to the provincial chart
        let active_closed = match self.active_view {
            ChartView::National => !self.show_national,
            ChartView::Yearly => !self.show_yearly,
            ChartView::Provincial => false,
        };
        if active_closed {
            self.active_view = ChartView::Provincial;
        }
    }
}
