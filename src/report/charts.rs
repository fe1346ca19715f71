// src/report/charts.rs
// Chart data preparation and a dependency-free SVG renderer

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::analysis::StructuredFindings;
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    MarketTrends,
    Technologies,
    Funding,
}

impl ChartKind {
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ChartKind::MarketTrends => "market_trends",
            ChartKind::Technologies => "technologies",
            ChartKind::Funding => "funding",
        }
    }
}

/// One labeled series, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub industry: String,
    pub title: String,
    pub axis_label: String,
    pub points: Vec<(String, f64)>,
}

/// Build the chart series for every non-empty findings list.
///
/// Bar series are sorted ascending by value; funding shares keep their order
/// and raw values.
pub fn chart_data(findings: &StructuredFindings, industry: &str) -> Vec<ChartData> {
    let mut charts = Vec::new();

    if !findings.market_trends.is_empty() {
        let points = findings
            .market_trends
            .iter()
            .map(|t| (t.trend.clone(), t.impact_score))
            .collect();
        charts.push(ChartData {
            kind: ChartKind::MarketTrends,
            industry: industry.to_string(),
            title: format!("Key {} Market Trends by Impact", industry),
            axis_label: "Impact Score".to_string(),
            points: sorted_ascending(points),
        });
    }

    if !findings.emerging_technologies.is_empty() {
        let points = findings
            .emerging_technologies
            .iter()
            .map(|t| (t.technology.clone(), t.adoption_rate))
            .collect();
        charts.push(ChartData {
            kind: ChartKind::Technologies,
            industry: industry.to_string(),
            title: format!("Emerging {} Technologies by Adoption Rate", industry),
            axis_label: "Adoption Rate (%)".to_string(),
            points: sorted_ascending(points),
        });
    }

    if !findings.funding_distribution.is_empty() {
        charts.push(ChartData {
            kind: ChartKind::Funding,
            industry: industry.to_string(),
            title: format!("{} Funding Distribution by Sector", industry),
            axis_label: "Share of Funding".to_string(),
            points: findings
                .funding_distribution
                .iter()
                .map(|f| (f.sector.clone(), f.percentage))
                .collect(),
        });
    }

    charts
}

fn sorted_ascending(mut points: Vec<(String, f64)>) -> Vec<(String, f64)> {
    points.sort_by(|a, b| a.1.total_cmp(&b.1));
    points
}

/// Turns one chart series into an image file on disk.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ChartData) -> AnalysisResult<PathBuf>;
}

/// Render every chart the findings support. A failed chart is logged and skipped.
pub fn render_visualizations(
    renderer: &dyn ChartRenderer,
    findings: &StructuredFindings,
    industry: &str,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for chart in chart_data(findings, industry) {
        match renderer.render(&chart) {
            Ok(path) => {
                info!(chart = chart.kind.file_suffix(), path = %path.display(), "Created visualization");
                paths.push(path);
            }
            Err(e) => warn!(chart = chart.kind.file_suffix(), error = %e, "Skipping chart"),
        }
    }
    paths
}

struct Palette {
    primary: &'static str,
    secondary: &'static str,
}

fn palette(industry: &str) -> Palette {
    let (primary, secondary) = match industry {
        "Healthcare" => ("#3498db", "#2980b9"),
        "Finance" => ("#2ecc71", "#27ae60"),
        "Technology" => ("#9b59b6", "#8e44ad"),
        "Retail" => ("#e74c3c", "#c0392b"),
        "Manufacturing" => ("#f39c12", "#d35400"),
        _ => ("#34495e", "#2c3e50"),
    };
    Palette { primary, secondary }
}

const PIE_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const WIDTH: f64 = 900.0;
const LABEL_WIDTH: f64 = 280.0;
const ROW_HEIGHT: f64 = 36.0;
const MARGIN: f64 = 40.0;

/// Writes `<industry>_<chart>.svg` files into one directory.
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    output_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn path_for(&self, chart: &ChartData) -> PathBuf {
        let industry = chart.industry.to_lowercase().replace(char::is_whitespace, "_");
        self.output_dir
            .join(format!("{}_{}.svg", industry, chart.kind.file_suffix()))
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, chart: &ChartData) -> AnalysisResult<PathBuf> {
        let render_err = |reason: String| AnalysisError::Render {
            chart: chart.kind.file_suffix().to_string(),
            reason,
        };

        if chart.points.is_empty() {
            return Err(render_err("no data points".to_string()));
        }

        let svg = match chart.kind {
            ChartKind::MarketTrends | ChartKind::Technologies => bar_chart_svg(chart),
            ChartKind::Funding => pie_chart_svg(chart).map_err(render_err)?,
        };

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| render_err(format!("cannot create {}: {}", self.output_dir.display(), e)))?;
        let path = self.path_for(chart);
        fs::write(&path, svg).map_err(|e| render_err(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

fn bar_chart_svg(chart: &ChartData) -> String {
    let colors = palette(&chart.industry);
    let rows = chart.points.len() as f64;
    let height = MARGIN * 2.0 + 40.0 + rows * ROW_HEIGHT + 30.0;
    let plot_left = MARGIN + LABEL_WIDTH;
    let plot_width = WIDTH - plot_left - MARGIN;
    let max_value = chart
        .points
        .iter()
        .map(|(_, v)| *v)
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut svg = svg_open(WIDTH, height, &chart.title);

    // Smallest value sits at the bottom row.
    for (i, (label, value)) in chart.points.iter().enumerate() {
        let row = rows - 1.0 - i as f64;
        let y = MARGIN + 40.0 + row * ROW_HEIGHT;
        let bar = (value.max(0.0) / max_value) * plot_width;
        let _ = write!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" class=\"label\">{}</text>",
            plot_left - 8.0,
            y + ROW_HEIGHT * 0.6,
            xml_escape(&truncate(label, 40))
        );
        let _ = write!(
            svg,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"{}\"/>",
            plot_left,
            y + 4.0,
            bar,
            ROW_HEIGHT - 8.0,
            colors.primary,
            colors.secondary
        );
        let _ = write!(
            svg,
            "<text x=\"{:.1}\" y=\"{:.1}\" class=\"value\">{}</text>",
            plot_left + bar + 6.0,
            y + ROW_HEIGHT * 0.6,
            format_value(*value)
        );
    }

    let axis_y = MARGIN + 40.0 + rows * ROW_HEIGHT;
    let _ = write!(
        svg,
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#333\"/>",
        plot_left,
        axis_y,
        plot_left + plot_width,
        axis_y
    );
    let _ = write!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" class=\"label\">{}</text>",
        plot_left + plot_width / 2.0,
        axis_y + 24.0,
        xml_escape(&chart.axis_label)
    );

    svg.push_str("</svg>");
    svg
}

/// Shares are scaled to sum to 100 here; the findings keep the raw values.
fn pie_chart_svg(chart: &ChartData) -> Result<String, String> {
    let total: f64 = chart.points.iter().map(|(_, v)| v.max(0.0)).sum();
    if total <= 0.0 {
        return Err("funding shares sum to zero".to_string());
    }

    let height = 640.0;
    let (cx, cy, r) = (WIDTH / 2.0 - 140.0, height / 2.0 + 20.0, 220.0);
    let mut svg = svg_open(WIDTH, height, &chart.title);
    let mut angle = -PI / 2.0;

    for (i, (label, value)) in chart.points.iter().enumerate() {
        let share = value.max(0.0) / total;
        let color = PIE_COLORS[i % PIE_COLORS.len()];

        if share >= 0.9999 {
            let _ = write!(svg, "<circle cx=\"{cx:.1}\" cy=\"{cy:.1}\" r=\"{r:.1}\" fill=\"{color}\"/>");
        } else if share > 0.0 {
            let end = angle + share * 2.0 * PI;
            let large_arc = if share > 0.5 { 1 } else { 0 };
            let _ = write!(
                svg,
                "<path d=\"M {cx:.1} {cy:.1} L {:.2} {:.2} A {r:.1} {r:.1} 0 {large_arc} 1 {:.2} {:.2} Z\" fill=\"{color}\" stroke=\"#fff\"/>",
                cx + r * angle.cos(),
                cy + r * angle.sin(),
                cx + r * end.cos(),
                cy + r * end.sin(),
            );
            angle = end;
        }

        let legend_y = MARGIN + 60.0 + i as f64 * 26.0;
        let legend_x = cx + r + 60.0;
        let _ = write!(
            svg,
            "<rect x=\"{legend_x:.1}\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{color}\"/>",
            legend_y - 11.0
        );
        let _ = write!(
            svg,
            "<text x=\"{:.1}\" y=\"{legend_y:.1}\" class=\"label\">{} ({:.1}%)</text>",
            legend_x + 22.0,
            xml_escape(&truncate(label, 32)),
            share * 100.0
        );
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn svg_open(width: f64, height: f64, title: &str) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">"
    );
    svg.push_str(
        "<style>.title{font:bold 20px sans-serif;fill:#1e293b}.label{font:13px sans-serif;fill:#334155}.value{font:12px sans-serif;fill:#475569}</style>",
    );
    let _ = write!(svg, "<rect width=\"{width:.0}\" height=\"{height:.0}\" fill=\"#ffffff\"/>");
    let _ = write!(
        svg,
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" class=\"title\">{}</text>",
        width / 2.0,
        MARGIN,
        xml_escape(title)
    );
    svg
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
