//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod pager;

pub use app::LaborChartsApp;
pub use chart_viewer::{ChartView, ChartViewer};
pub use control_panel::{ControlPanel, ControlPanelAction};
