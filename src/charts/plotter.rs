//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::data::{NationalDistribution, ProvinceBreakdown, YearTotal};
use egui::{Color32, RichText};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text,
};
use std::f64::consts::PI;

/// Color palette for activities
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
];

/// Color of the "Resto" pie slice
pub const OTHER_COLOR: Color32 = Color32::from_rgb(96, 125, 139); // Blue Grey

pub const LINE_COLOR: Color32 = Color32::from_rgb(52, 152, 219);

/// Angle (degrees, counterclockwise from the x axis) of the first pie slice
pub const PIE_START_DEGREES: f64 = 70.0;

/// Largest arc drawn as a single polygon; egui only fills convex shapes.
const MAX_WEDGE_ARC: f64 = PI / 2.0;

/// Split a label onto two lines after `width` characters.
pub fn wrap_label(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width).collect();
    let tail: String = text.chars().skip(width).collect();
    format!("{}\n{}", head, tail)
}

/// Start and end angles (radians) of each slice, proportional to `values`.
pub fn pie_angles(values: &[f64], start_degrees: f64) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().sum();
    let mut start = start_degrees.to_radians();

    values
        .iter()
        .map(|&v| {
            let sweep = if total > 0.0 { v / total * 2.0 * PI } else { 0.0 };
            let span = (start, start + sweep);
            start += sweep;
            span
        })
        .collect()
}

/// Outline of a wedge of the unit circle: the center followed by points along the arc.
fn wedge_points(start: f64, end: f64) -> Vec<[f64; 2]> {
    let steps = (((end - start) / (PI / 60.0)).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push([0.0, 0.0]);
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push([angle.cos(), angle.sin()]);
    }
    points
}

/// Creates the employment charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get color for the activity at a given rank.
    pub fn get_activity_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Horizontal bars of a province's top activities, largest on top.
    pub fn draw_breakdown_chart(
        ui: &mut egui::Ui,
        breakdown: &ProvinceBreakdown,
        label_wrap: usize,
    ) {
        ui.label(
            RichText::new(format!(
                "Top {} empleos por actividad en {} (Porcentaje)",
                breakdown.shares.len(),
                breakdown.province
            ))
            .size(18.0)
            .strong(),
        );
        ui.add_space(6.0);

        let n = breakdown.shares.len();
        // Row 0 is the bottom of the plot
        let labels: Vec<String> = breakdown
            .shares
            .iter()
            .rev()
            .map(|s| wrap_label(&s.activity, label_wrap))
            .collect();

        let bars: Vec<Bar> = breakdown
            .shares
            .iter()
            .enumerate()
            .map(|(i, share)| {
                Bar::new((n - 1 - i) as f64, share.percent)
                    .width(0.7)
                    .name(&share.activity)
                    .fill(Self::get_activity_color(i))
            })
            .collect();

        Plot::new(format!("breakdown_{}", breakdown.province))
            .height((ui.available_height() - 50.0).max(240.0))
            .allow_scroll(false)
            .include_x(0.0)
            .x_axis_label("Porcentaje de Puestos de Trabajo en la provincia")
            .y_axis_label("Actividad Económica")
            .y_grid_spacer(move |_input| {
                (0..n)
                    .map(|i| GridMark {
                        value: i as f64,
                        step_size: 1.0,
                    })
                    .collect()
            })
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (mark.value - idx).abs() < 1e-6 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .x_axis_formatter(|mark, _range| format!("{:.0}%", mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Pie of the national top activities and the remainder.
    pub fn draw_national_pie(ui: &mut egui::Ui, national: &NationalDistribution) {
        let slices = national.slices();
        let values: Vec<f64> = slices.iter().map(|s| s.jobs as f64).collect();
        let angles = pie_angles(&values, PIE_START_DEGREES);

        ui.label(
            RichText::new("Composición de puestos de trabajo a nivel nacional")
                .size(16.0)
                .strong(),
        );

        Plot::new("national_pie")
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .include_x(-1.8)
            .include_x(1.8)
            .include_y(-1.4)
            .include_y(1.4)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (i, (slice, &(start, end))) in slices.iter().zip(angles.iter()).enumerate() {
                    let color = if i < national.top.len() {
                        Self::get_activity_color(i)
                    } else {
                        OTHER_COLOR
                    };

                    let mut from = start;
                    while from < end {
                        let to = (from + MAX_WEDGE_ARC).min(end);
                        let outline: PlotPoints = wedge_points(from, to).into_iter().collect();
                        plot_ui.polygon(
                            Polygon::new(outline)
                                .fill_color(color)
                                .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                                .name(&slice.label),
                        );
                        from = to;
                    }

                    let mid = (start + end) / 2.0;
                    plot_ui.text(Text::new(
                        PlotPoint::new(0.6 * mid.cos(), 0.6 * mid.sin()),
                        RichText::new(format!("{:.1}%", slice.percent))
                            .color(Color32::WHITE)
                            .strong(),
                    ));
                }
            });
    }

    /// Line of total job posts per year with point markers.
    pub fn draw_yearly_line(ui: &mut egui::Ui, yearly: &[YearTotal]) {
        ui.label(
            RichText::new("Total de Puestos de Trabajo por Año")
                .size(16.0)
                .strong(),
        );

        let points: Vec<[f64; 2]> = yearly
            .iter()
            .map(|t| [t.year as f64, t.jobs as f64])
            .collect();

        Plot::new("yearly_line")
            .allow_scroll(false)
            .x_axis_label("Año")
            .y_axis_label("Total de Puestos de Trabajo")
            .x_axis_formatter(|mark, _range| {
                if mark.value.fract() == 0.0 {
                    format!("{:.0}", mark.value)
                } else {
                    String::new()
                }
            })
            .y_axis_formatter(|mark, _range| format!("{:.0}", mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(LINE_COLOR)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(4.0)
                        .color(LINE_COLOR),
                );
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_label_splits_once() {
        let long = "Servicios de transporte y almacenamiento de mercaderías varias";
        let wrapped = wrap_label(long, 44);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), 44);
        assert_eq!(wrapped.replace('\n', ""), long);
    }

    #[test]
    fn test_wrap_label_short_is_unchanged() {
        assert_eq!(wrap_label("Pesca", 44), "Pesca");
    }

    #[test]
    fn test_pie_angles_cover_full_circle() {
        let angles = pie_angles(&[1.0, 2.0, 1.0], PIE_START_DEGREES);
        let start = PIE_START_DEGREES.to_radians();
        assert_eq!(angles[0].0, start);
        assert!((angles[1].1 - angles[1].0 - PI).abs() < 1e-12);
        assert!((angles[2].1 - (start + 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_pie_angles_zero_total() {
        let angles = pie_angles(&[0.0, 0.0], 0.0);
        assert!(angles.iter().all(|&(s, e)| s == e));
    }

    #[test]
    fn test_wedge_points_start_at_center() {
        let points = wedge_points(0.0, PI / 2.0);
        assert_eq!(points[0], [0.0, 0.0]);
        let last = points[points.len() - 1];
        assert!(last[0].abs() < 1e-12 && (last[1] - 1.0).abs() < 1e-12);
    }
}
