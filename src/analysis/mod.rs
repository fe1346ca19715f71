// src/analysis/mod.rs
//! Multi-chunk market analysis: prompts, per-chunk calls, findings parsing,
//! consolidation and the pipeline that ties them together.

pub mod analyzer;
pub mod consolidator;
pub mod findings;
pub mod parser;
pub mod pipeline;
pub mod prompts;

pub use analyzer::{BatchAnalysis, ChunkAnalyzer, ChunkResult};
pub use consolidator::{Consolidation, Consolidator};
pub use findings::{EmergingTechnology, FundingShare, MarketTrend, StructuredFindings};
pub use parser::{clean_analysis_text, extract_structured};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline, OutcomeStatus};
pub use prompts::{AnalysisParameters, PromptLibrary};
