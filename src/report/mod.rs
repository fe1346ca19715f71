// src/report/mod.rs
//! Charts and final report documents.

pub mod charts;
pub mod render;

pub use charts::{chart_data, render_visualizations, ChartData, ChartKind, ChartRenderer, SvgChartRenderer};
pub use render::{generate_report, save_report, ReportFormat};
