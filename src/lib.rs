pub mod analysis;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod monitoring;
pub mod report;

pub use analysis::{AnalysisOutcome, AnalysisParameters, AnalysisPipeline, StructuredFindings};
pub use config::AppConfig;
pub use error::{AnalysisError, AnalysisResult};
