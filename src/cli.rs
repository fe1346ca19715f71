// src/cli.rs
// Command-line surface. Enumerated options map to the labels used in prompts.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::analysis::AnalysisParameters;
use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "trendlens",
    version,
    about = "Industry trend analysis of web articles with a local Ollama model"
)]
pub struct Cli {
    /// Read article text from this file
    #[arg(long, short = 'f', conflicts_with = "urls")]
    pub file: Option<PathBuf>,

    /// Fetch and analyze this page; repeatable
    #[arg(long = "url", short = 'u')]
    pub urls: Vec<String>,

    /// Use the curated news sources for the industry (Healthcare, Finance)
    #[arg(long, default_value_t = false, conflicts_with = "file")]
    pub curated: bool,

    #[arg(long, short = 'i', value_enum, default_value_t = Industry::Technology)]
    pub industry: Industry,

    #[arg(long, short = 'a', value_enum, default_value_t = AnalysisType::Comprehensive)]
    pub analysis_type: AnalysisType,

    #[arg(long, short = 't', value_enum, default_value_t = TimePeriod::CurrentAndNearFuture)]
    pub time_period: TimePeriod,

    #[arg(long, short = 'd', value_enum, default_value_t = DetailLevel::Detailed)]
    pub detail_level: DetailLevel,

    /// Ollama model; defaults to DEFAULT_MODEL
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    #[arg(long, short = 'c', default_value = "")]
    pub custom_prompt: String,

    /// Per-chunk timeout in seconds; defaults to ANALYSIS_TIMEOUT_SECS
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Html)]
    pub output_format: OutputFormat,

    /// Report directory; defaults to REPORT_DIR
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Also write the findings behind the charts as JSON
    #[arg(long)]
    pub findings_json: Option<PathBuf>,

    /// Print backend reachability and installed models, then exit
    #[arg(long, default_value_t = false)]
    pub check_backend: bool,
}

impl Cli {
    pub fn parameters(&self) -> AnalysisParameters {
        AnalysisParameters {
            industry: self.industry.label().to_string(),
            analysis_type: self.analysis_type.label().to_string(),
            time_period: self.time_period.label().to_string(),
            detail_level: self.detail_level.label().to_string(),
            custom_prompt: self.custom_prompt.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Industry {
    Technology,
    Healthcare,
    Finance,
    Retail,
    Manufacturing,
    Other,
}

impl Industry {
    pub fn label(self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Healthcare => "Healthcare",
            Self::Finance => "Finance",
            Self::Retail => "Retail",
            Self::Manufacturing => "Manufacturing",
            Self::Other => "Other",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AnalysisType {
    Comprehensive,
    MarketTrends,
    TechnologyFocus,
    CompetitiveAnalysis,
    InvestmentOpportunities,
}

impl AnalysisType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Comprehensive => "Comprehensive",
            Self::MarketTrends => "Market Trends",
            Self::TechnologyFocus => "Technology Focus",
            Self::CompetitiveAnalysis => "Competitive Analysis",
            Self::InvestmentOpportunities => "Investment Opportunities",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TimePeriod {
    Current,
    CurrentAndNearFuture,
    LongTermFuture,
}

impl TimePeriod {
    pub fn label(self) -> &'static str {
        match self {
            Self::Current => "Current",
            Self::CurrentAndNearFuture => "Current and Near-Future",
            Self::LongTermFuture => "Long-term Future",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DetailLevel {
    Brief,
    Detailed,
    Comprehensive,
}

impl DetailLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Brief => "Brief",
            Self::Detailed => "Detailed",
            Self::Comprehensive => "Comprehensive",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Markdown,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Html => ReportFormat::Html,
            OutputFormat::Markdown => ReportFormat::Markdown,
        }
    }
}
