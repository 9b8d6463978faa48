//! Static Chart Renderer
//! Writes the chart views to PNG files with plotters.

use crate::charts::plotter::{ChartPlotter, LINE_COLOR, OTHER_COLOR, PIE_START_DEGREES};
use crate::data::{NationalDistribution, ProvinceBreakdown, YearTotal};
use egui::Color32;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const WIDTH: u32 = 1400;
const HEIGHT: u32 = 900;
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Nothing to draw")]
    Empty,
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(e.to_string())
    }
}

fn to_rgb(color: Color32) -> RGBColor {
    RGBColor(color.r(), color.g(), color.b())
}

/// Single-line form of a label, cut to `width` characters.
fn shorten_label(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Horizontal bars of one province's top activities.
    pub fn render_breakdown(
        breakdown: &ProvinceBreakdown,
        label_wrap: usize,
        path: &Path,
    ) -> Result<(), RenderError> {
        let n = breakdown.shares.len();
        if n == 0 {
            return Err(RenderError::Empty);
        }

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_max = breakdown
            .shares
            .iter()
            .map(|s| s.percent)
            .fold(0.0, f64::max)
            .max(1.0)
            * 1.1;

        // Segment 0 is the bottom row
        let labels: Vec<String> = breakdown
            .shares
            .iter()
            .rev()
            .map(|s| shorten_label(&s.activity, label_wrap))
            .collect();

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!(
                    "Top {} empleos por actividad en {} (Porcentaje)",
                    n, breakdown.province
                ),
                (FONT, 26),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(420)
            .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&|v: &SegmentValue<usize>| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    labels.get(*i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .x_label_formatter(&|x| format!("{:.0}%", x))
            .x_desc("Porcentaje de Puestos de Trabajo en la provincia")
            .label_style((FONT, 14))
            .draw()?;

        chart.draw_series(breakdown.shares.iter().enumerate().map(|(i, share)| {
            let row = n - 1 - i;
            let color = to_rgb(ChartPlotter::get_activity_color(i));
            let mut bar: Rectangle<(f64, SegmentValue<usize>)> = Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(row)),
                    (share.percent, SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            );
            bar.set_margin(6, 6, 0, 0);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    /// Pie of the national distribution with percentage labels.
    pub fn render_national(
        national: &NationalDistribution,
        label_wrap: usize,
        path: &Path,
    ) -> Result<(), RenderError> {
        let slices = national.slices();
        if slices.is_empty() || national.total <= 0 {
            return Err(RenderError::Empty);
        }

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            "Composición de puestos de trabajo a nivel nacional",
            (FONT, 26),
        )?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.33;

        let sizes: Vec<f64> = slices.iter().map(|s| s.jobs as f64).collect();
        let colors: Vec<RGBColor> = (0..slices.len())
            .map(|i| {
                if i < national.top.len() {
                    to_rgb(ChartPlotter::get_activity_color(i))
                } else {
                    to_rgb(OTHER_COLOR)
                }
            })
            .collect();
        let labels: Vec<String> = slices
            .iter()
            .map(|s| shorten_label(&s.label, label_wrap))
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(PIE_START_DEGREES);
        pie.label_style((FONT, 15).into_font());
        pie.percentages((FONT, 14).into_font().color(&WHITE));
        root.draw(&pie)?;

        root.present()?;
        Ok(())
    }

    /// Total job posts per year as a line with markers.
    pub fn render_yearly(yearly: &[YearTotal], path: &Path) -> Result<(), RenderError> {
        let (Some(first), Some(last)) = (yearly.first(), yearly.last()) else {
            return Err(RenderError::Empty);
        };

        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_max = yearly.iter().map(|t| t.jobs).max().unwrap_or(0).max(1) as f64 * 1.1;
        let color = to_rgb(LINE_COLOR);

        let mut chart = ChartBuilder::on(&root)
            .caption("Total de Puestos de Trabajo por Año", (FONT, 26))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d((first.year - 1)..(last.year + 1), 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Año")
            .y_desc("Total de Puestos de Trabajo")
            .x_label_formatter(&|year| year.to_string())
            .y_label_formatter(&|jobs| format!("{:.0}", jobs))
            .label_style((FONT, 14))
            .draw()?;

        let points: Vec<(i32, f64)> = yearly.iter().map(|t| (t.year, t.jobs as f64)).collect();
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 5, color.filled())),
        )?;

        root.present()?;
        Ok(())
    }
}
