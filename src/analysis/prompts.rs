// src/analysis/prompts.rs
// Industry prompt templates and their interpolation

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex"));

/// Trailing block every template asks the model to emit.
const FINDINGS_BLOCK: &str = r#"### VISUALIZATION DATA:
At the end of your response, include a JSON block between triple backticks with exactly this structure:
```json
{
  "market_trends": [
    {"trend": "Trend Name 1", "impact_score": 85},
    {"trend": "Trend Name 2", "impact_score": 75},
    {"trend": "Trend Name 3", "impact_score": 65},
    {"trend": "Trend Name 4", "impact_score": 60},
    {"trend": "Trend Name 5", "impact_score": 55}
  ],
  "emerging_technologies": [
    {"technology": "Technology 1", "adoption_rate": 80},
    {"technology": "Technology 2", "adoption_rate": 65},
    {"technology": "Technology 3", "adoption_rate": 50},
    {"technology": "Technology 4", "adoption_rate": 45},
    {"technology": "Technology 5", "adoption_rate": 40}
  ],
  "funding_distribution": [
    {"sector": "Sector 1", "percentage": 35},
    {"sector": "Sector 2", "percentage": 25},
    {"sector": "Sector 3", "percentage": 20},
    {"sector": "Sector 4", "percentage": 15},
    {"sector": "Other", "percentage": 5}
  ]
}
```
Use realistic values based on your analysis. This JSON is used to draw charts."#;

const HEALTHCARE_TEMPLATE: &str = r#"You are HealthTrendAnalyst, an expert in healthcare industry analysis for startups and investors.

### SOURCE CONTENT:
{dom_content}

### ANALYSIS PARAMETERS:
- Industry: Healthcare/Medical
- Analysis Type: {analysis_type}
- Time Focus: {time_period}
- Detail Level: {detail_level}
- Specific Focus: {custom_prompt}
- Report Date: {report_date}

### TASK:
Analyze the healthcare content above and extract market trends, opportunities, regulatory developments and insights for healthcare startups.

### OUTPUT FORMAT:
Write a markdown analysis with these sections:
1. **Key Market Trends**: 3-5 major healthcare market trends relevant to startups
2. **Emerging Technologies**: healthcare technologies gaining traction (AI diagnostics, telehealth, wearables, ...)
3. **Regulatory Landscape**: recent or upcoming regulatory changes affecting healthcare startups
4. **Funding Environment**: funding trends, significant investments, active investors
5. **Competitive Analysis**: key players, acquisitions, positioning
6. **Market Opportunities**: unmet needs and openings for healthcare startups
7. **Strategic Recommendations**: actionable insights for healthcare startups

{findings_block}

### GUIDELINES:
- Stick to facts found in the source content
- Name healthcare subsectors (digital health, biotech, medical devices, ...)
- Name the companies, technologies and regulators mentioned in the content
- Mention specific diseases or conditions when relevant
- Write "Insufficient data" for sections the content cannot support
- Cite the supporting evidence for each insight
- Match the requested detail level: {detail_level}
"#;

const FINANCE_TEMPLATE: &str = r#"You are FinTechAnalyst, an expert in financial services and fintech analysis for startups and investors.

### SOURCE CONTENT:
{dom_content}

### ANALYSIS PARAMETERS:
- Industry: Finance/Fintech
- Analysis Type: {analysis_type}
- Time Focus: {time_period}
- Detail Level: {detail_level}
- Specific Focus: {custom_prompt}
- Report Date: {report_date}

### TASK:
Analyze the finance content above and extract market trends, opportunities, regulatory developments and insights for fintech startups.

### OUTPUT FORMAT:
Write a markdown analysis with these sections:
1. **Key Market Trends**: 3-5 major fintech market trends relevant to startups
2. **Emerging Technologies**: financial technologies gaining traction (blockchain, embedded finance, AI, ...)
3. **Regulatory Landscape**: recent or upcoming regulatory changes affecting fintech startups
4. **Funding Environment**: funding trends, significant investments, active investors
5. **Competitive Analysis**: key players, acquisitions, positioning
6. **Market Opportunities**: unmet needs and openings for fintech startups
7. **Strategic Recommendations**: actionable insights for fintech startups

{findings_block}

### GUIDELINES:
- Stick to facts found in the source content
- Name fintech subsectors (payments, lending, wealth management, insurtech, ...)
- Name the companies, technologies and regulators mentioned in the content
- Mention specific financial products or market segments when relevant
- Write "Insufficient data" for sections the content cannot support
- Cite the supporting evidence for each insight
- Match the requested detail level: {detail_level}
"#;

const GENERIC_TEMPLATE: &str = r#"You are IndustryAnalyst, an expert in {industry} industry analysis for startups and investors.

### SOURCE CONTENT:
{dom_content}

### ANALYSIS PARAMETERS:
- Industry: {industry}
- Analysis Type: {analysis_type}
- Time Focus: {time_period}
- Detail Level: {detail_level}
- Specific Focus: {custom_prompt}
- Report Date: {report_date}

### TASK:
Analyze the {industry} content above and extract market trends, opportunities, regulatory developments and insights for {industry} startups.

### OUTPUT FORMAT:
Write a markdown analysis with these sections:
1. **Key Market Trends**: 3-5 major market trends relevant to startups in this industry
2. **Emerging Technologies**: technologies gaining traction in the {industry} sector
3. **Regulatory Landscape**: recent or upcoming regulatory changes affecting {industry} startups
4. **Funding Environment**: funding trends, significant investments, active investors in {industry}
5. **Competitive Analysis**: key players, acquisitions, positioning
6. **Market Opportunities**: unmet needs and openings for {industry} startups
7. **Strategic Recommendations**: actionable insights for {industry} startups

{findings_block}

### GUIDELINES:
- Stick to facts found in the source content
- Name {industry} subsectors when possible
- Name the companies, technologies and regulators mentioned in the content
- Write "Insufficient data" for sections the content cannot support
- Cite the supporting evidence for each insight
- Match the requested detail level: {detail_level}
"#;

const CONSOLIDATION_TEMPLATE: &str = r#"You are a senior industry analyst specializing in {industry} markets.

Below are separate analyses of different content chunks from {industry} industry sources.
Consolidate them into a single coherent analysis, removing duplicates and keeping the most significant insights:

{combined_analysis}

Create a comprehensive {industry} industry report ({detail_level} detail) with these sections:

1. **Executive Summary**: overview of the major findings (2-3 paragraphs)
2. **Key Market Trends**: the most significant trends across all analyses
3. **Emerging Technologies**: the most promising technologies for {industry} startups
4. **Regulatory Landscape**: key regulatory developments in the {industry} space
5. **Funding Environment**: notable funding trends and significant investments
6. **Competitive Analysis**: key players and competitive dynamics
7. **Market Opportunities**: the best opportunities for {industry} startups
8. **Strategic Recommendations**: 5-7 actionable recommendations for {industry} startups
9. **Future Outlook**: predictions for the next 12-24 months in the {industry} space

{findings_block}
"#;

/// User-selected analysis options, interpolated verbatim into the prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisParameters {
    pub industry: String,
    pub analysis_type: String,
    pub time_period: String,
    pub detail_level: String,
    pub custom_prompt: String,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            industry: "Technology".to_string(),
            analysis_type: "Comprehensive".to_string(),
            time_period: "Current and Near-Future".to_string(),
            detail_level: "Detailed".to_string(),
            custom_prompt: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Healthcare,
    Finance,
    Generic,
}

impl TemplateKind {
    pub fn for_industry(industry: &str) -> Self {
        match industry {
            "Healthcare" => TemplateKind::Healthcare,
            "Finance" => TemplateKind::Finance,
            _ => TemplateKind::Generic,
        }
    }
}

/// Immutable set of templates, built once per process.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    healthcare: String,
    finance: String,
    generic: String,
    consolidation: String,
    report_date: String,
}

impl PromptLibrary {
    pub fn new(report_date: impl Into<String>) -> Self {
        Self {
            healthcare: HEALTHCARE_TEMPLATE.to_string(),
            finance: FINANCE_TEMPLATE.to_string(),
            generic: GENERIC_TEMPLATE.to_string(),
            consolidation: CONSOLIDATION_TEMPLATE.to_string(),
            report_date: report_date.into(),
        }
    }

    /// Library dated today, e.g. "October 19, 2026".
    pub fn dated_today() -> Self {
        Self::new(chrono::Local::now().format("%B %d, %Y").to_string())
    }

    pub fn report_date(&self) -> &str {
        &self.report_date
    }

    fn template(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Healthcare => &self.healthcare,
            TemplateKind::Finance => &self.finance,
            TemplateKind::Generic => &self.generic,
        }
    }

    /// Prompt for one chunk of source content.
    pub fn chunk_prompt(&self, params: &AnalysisParameters, content: &str) -> String {
        let template = self.template(TemplateKind::for_industry(&params.industry));
        let mut vars = self.base_vars(params);
        vars.insert("dom_content", content);
        interpolate(template, &vars)
    }

    /// Prompt merging every per-chunk analysis into one report.
    pub fn consolidation_prompt(&self, params: &AnalysisParameters, combined: &str) -> String {
        let mut vars = self.base_vars(params);
        vars.insert("combined_analysis", combined);
        interpolate(&self.consolidation, &vars)
    }

    fn base_vars<'a>(&'a self, params: &'a AnalysisParameters) -> HashMap<&'static str, &'a str> {
        HashMap::from([
            ("industry", params.industry.as_str()),
            ("analysis_type", params.analysis_type.as_str()),
            ("time_period", params.time_period.as_str()),
            ("detail_level", params.detail_level.as_str()),
            ("custom_prompt", params.custom_prompt.as_str()),
            ("report_date", self.report_date.as_str()),
            ("findings_block", FINDINGS_BLOCK),
        ])
    }
}

/// Single pass over the template: substituted values are never rescanned,
/// and unknown placeholders are left as they are.
fn interpolate(template: &str, vars: &HashMap<&'static str, &str>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(industry: &str) -> AnalysisParameters {
        AnalysisParameters {
            industry: industry.to_string(),
            custom_prompt: "seed-stage startups".to_string(),
            ..AnalysisParameters::default()
        }
    }

    #[test]
    fn test_template_selection() {
        assert_eq!(TemplateKind::for_industry("Healthcare"), TemplateKind::Healthcare);
        assert_eq!(TemplateKind::for_industry("Finance"), TemplateKind::Finance);
        assert_eq!(TemplateKind::for_industry("Retail"), TemplateKind::Generic);
    }

    #[test]
    fn test_chunk_prompt_interpolates_everything() {
        let library = PromptLibrary::new("October 19, 2026");
        let prompt = library.chunk_prompt(&params("Retail"), "Shoppers moved online.");

        assert!(prompt.contains("expert in Retail industry analysis"));
        assert!(prompt.contains("Shoppers moved online."));
        assert!(prompt.contains("- Specific Focus: seed-stage startups"));
        assert!(prompt.contains("- Report Date: October 19, 2026"));
        assert!(prompt.contains("```json"));
        assert!(prompt.contains(r#""funding_distribution""#));
        assert!(!prompt.contains("{dom_content}"));
        assert!(!prompt.contains("{findings_block}"));
    }

    #[test]
    fn test_healthcare_template_is_fixed_industry() {
        let library = PromptLibrary::new("today");
        let prompt = library.chunk_prompt(&params("Healthcare"), "content");
        assert!(prompt.contains("HealthTrendAnalyst"));
        assert!(prompt.contains("- Industry: Healthcare/Medical"));
    }

    #[test]
    fn test_content_is_not_rescanned() {
        let library = PromptLibrary::new("today");
        let prompt = library.chunk_prompt(&params("Finance"), "literal {industry} stays");
        assert!(prompt.contains("literal {industry} stays"));
    }

    #[test]
    fn test_consolidation_prompt_has_extended_sections() {
        let library = PromptLibrary::new("today");
        let prompt = library.consolidation_prompt(&params("Finance"), "chunk one\n\nchunk two");
        assert!(prompt.contains("Executive Summary"));
        assert!(prompt.contains("Future Outlook"));
        assert!(prompt.contains("chunk one\n\nchunk two"));
        assert!(prompt.contains("specializing in Finance markets"));
    }
}
