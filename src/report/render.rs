// src/report/render.rs
// Report assembly: Markdown or a standalone HTML page with charts embedded

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Local};
use tracing::{debug, error, warn};

use crate::error::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Html,
    Markdown,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Html => f.write_str("html"),
            ReportFormat::Markdown => f.write_str("markdown"),
        }
    }
}

const HTML_STYLE: &str = r#"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f9f9f9; max-width: 1200px; margin: 0 auto; }
    h1, h2, h3 { color: #2c3e50; margin-top: 20px; }
    h1 { font-size: 32px; border-bottom: 2px solid #eaecef; padding-bottom: 10px; }
    h2 { font-size: 24px; border-bottom: 1px solid #eaecef; padding-bottom: 8px; }
    img { max-width: 100%; height: auto; margin: 20px 0; border-radius: 5px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
    .visualization-container { margin-bottom: 30px; }
    .date { color: #666; margin-bottom: 20px; }
    .content { background-color: white; padding: 30px; border-radius: 10px; box-shadow: 0 3px 10px rgba(0,0,0,0.1); }
    #analysis-content { white-space: pre-wrap; }
"#;

/// Assemble the final document.
///
/// `analysis_text` is expected to be escaped already. Visualization paths that
/// do not exist are skipped; in HTML an unreadable image becomes an error block.
pub fn generate_report(
    analysis_text: &str,
    visualizations: &[PathBuf],
    industry: &str,
    date: &str,
    format: ReportFormat,
) -> String {
    let existing: Vec<&PathBuf> = visualizations
        .iter()
        .filter(|path| {
            let exists = path.exists();
            if !exists {
                warn!(path = %path.display(), "Visualization path does not exist");
            }
            exists
        })
        .collect();
    debug!(format = %format, charts = existing.len(), "Generating report");

    match format {
        ReportFormat::Markdown => markdown_report(analysis_text, &existing, industry, date),
        ReportFormat::Html => html_report(analysis_text, &existing, industry, date),
    }
}

fn markdown_report(text: &str, charts: &[&PathBuf], industry: &str, date: &str) -> String {
    let mut report = format!(
        "# {} Industry Analysis Report\n\nGenerated on {}\n\n---\n\n{}\n\n",
        industry, date, text
    );
    if !charts.is_empty() {
        report.push_str("\n## Visualizations\n\n");
        for path in charts {
            let title = chart_title(path, industry);
            report.push_str(&format!("### {}\n\n![{}]({})\n\n", title, title, path.display()));
        }
    }
    report
}

fn html_report(text: &str, charts: &[&PathBuf], industry: &str, date: &str) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{industry} Industry Analysis Report</title>\n<meta charset=\"UTF-8\">\n<style>{HTML_STYLE}</style>\n</head>\n<body>\n<div class=\"content\">\n<h1>{industry} Industry Analysis Report</h1>\n<p class=\"date\">Generated on {date}</p>\n<hr>\n<div id=\"analysis-content\">\n{text}\n</div>\n"
    );

    if !charts.is_empty() {
        html.push_str("<div id=\"visualizations\">\n<h2>Visualizations</h2>\n");
        for path in charts {
            let title = chart_title(path, industry);
            match fs::read(path) {
                Ok(bytes) => {
                    html.push_str(&format!(
                        "<div class=\"visualization-container\">\n<h3>{}</h3>\n<img src=\"data:{};base64,{}\" alt=\"{}\">\n</div>\n",
                        title,
                        mime_type(path),
                        STANDARD.encode(bytes),
                        title
                    ));
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Error embedding visualization");
                    html.push_str(&format!(
                        "<div class=\"visualization-container\">\n<h3>Error Loading Visualization</h3>\n<p>Could not load: {} (Error: {})</p>\n</div>\n",
                        file_name(path),
                        e
                    ));
                }
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// "healthcare_market_trends.svg" -> "Market Trends"
fn chart_title(path: &Path, industry: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{}_", industry.to_lowercase().replace(char::is_whitespace, "_"));
    let stem = stem.strip_prefix(&prefix).unwrap_or(&stem);

    stem.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("svg") => "image/svg+xml",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write the report as `<industry>_analysis_<YYYYmmdd_HHMMSS>.<ext>` under `dir`.
pub fn save_report(dir: &Path, industry: &str, format: ReportFormat, content: &str) -> AnalysisResult<PathBuf> {
    save_report_at(dir, industry, format, content, Local::now())
}

pub fn save_report_at(
    dir: &Path,
    industry: &str,
    format: ReportFormat,
    content: &str,
    at: DateTime<Local>,
) -> AnalysisResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let name = format!(
        "{}_analysis_{}.{}",
        industry.to_lowercase().replace(char::is_whitespace, "_"),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_chart_title() {
        assert_eq!(
            chart_title(Path::new("/tmp/healthcare_market_trends.svg"), "Healthcare"),
            "Market Trends"
        );
        assert_eq!(chart_title(Path::new("finance_funding.png"), "Finance"), "Funding");
    }

    #[test]
    fn test_markdown_skips_missing_paths() {
        let report = generate_report(
            "Body text",
            &[PathBuf::from("/definitely/not/here.svg")],
            "Retail",
            "2026-10-19",
            ReportFormat::Markdown,
        );
        assert!(report.starts_with("# Retail Industry Analysis Report\n\nGenerated on 2026-10-19"));
        assert!(report.contains("Body text"));
        assert!(!report.contains("## Visualizations"));
    }

    #[test]
    fn test_html_embeds_images_as_base64() {
        let dir = TempDir::new().unwrap();
        let chart = dir.path().join("retail_funding.svg");
        fs::write(&chart, "<svg></svg>").unwrap();

        let html = generate_report("Body", &[chart], "Retail", "today", ReportFormat::Html);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h3>Funding</h3>"));
        assert!(html.contains(&format!("data:image/svg+xml;base64,{}", STANDARD.encode("<svg></svg>"))));
    }

    #[test]
    fn test_save_report_name() {
        let dir = TempDir::new().unwrap();
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let path = save_report_at(dir.path(), "Healthcare", ReportFormat::Markdown, "x", at).unwrap();
        assert_eq!(path.file_name().unwrap(), "healthcare_analysis_20260304_050607.md");
        assert_eq!(fs::read_to_string(path).unwrap(), "x");
    }

    #[test]
    fn test_save_report_into_file_path_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();

        let err = save_report(&blocker, "Finance", ReportFormat::Html, "x").unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
        assert!(!err.is_recoverable());
    }
}
