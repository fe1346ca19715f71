// src/analysis/findings.rs
// Structured market findings as emitted by the model, with lenient coercion

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SCORE: f64 = 50.0;
pub const DEFAULT_PERCENTAGE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTrend {
    pub trend: String,
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergingTechnology {
    pub technology: String,
    pub adoption_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingShare {
    pub sector: String,
    /// Raw model value; shares are not normalized to 100 here.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFindings {
    pub market_trends: Vec<MarketTrend>,
    pub emerging_technologies: Vec<EmergingTechnology>,
    pub funding_distribution: Vec<FundingShare>,
}

impl StructuredFindings {
    /// Build findings from any JSON object that carries at least one known list.
    ///
    /// Entries keep their order. Missing labels become "Trend N" style names,
    /// and numbers that cannot be read fall back to the defaults.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !["market_trends", "emerging_technologies", "funding_distribution"]
            .iter()
            .any(|key| obj.contains_key(*key))
        {
            return None;
        }

        let market_trends = entries(obj, "market_trends")
            .enumerate()
            .map(|(i, item)| MarketTrend {
                trend: label(item, "trend", || format!("Trend {}", i + 1)),
                impact_score: number(item, "impact_score", DEFAULT_SCORE),
            })
            .collect();

        let emerging_technologies = entries(obj, "emerging_technologies")
            .enumerate()
            .map(|(i, item)| EmergingTechnology {
                technology: label(item, "technology", || format!("Tech {}", i + 1)),
                adoption_rate: number(item, "adoption_rate", DEFAULT_SCORE),
            })
            .collect();

        let funding_distribution = entries(obj, "funding_distribution")
            .enumerate()
            .map(|(i, item)| FundingShare {
                sector: label(item, "sector", || format!("Sector {}", i + 1)),
                percentage: number(item, "percentage", DEFAULT_PERCENTAGE),
            })
            .collect();

        Some(Self {
            market_trends,
            emerging_technologies,
            funding_distribution,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.market_trends.is_empty()
            && self.emerging_technologies.is_empty()
            && self.funding_distribution.is_empty()
    }
}

fn entries<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn label(item: &Value, key: &str, fallback: impl FnOnce() -> String) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback(),
    }
}

/// Best-effort float: numbers as-is, numeric strings parsed (a trailing `%` is
/// allowed), booleans as 0/1, anything else the default.
fn number(item: &Value, key: &str, default: f64) -> f64 {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(default),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_object() {
        let value = json!({
            "market_trends": [{"trend": "AI diagnostics", "impact_score": 85}],
            "emerging_technologies": [{"technology": "Wearables", "adoption_rate": 62.5}],
            "funding_distribution": [{"sector": "Digital health", "percentage": 40}]
        });
        let findings = StructuredFindings::from_value(&value).unwrap();
        assert_eq!(findings.market_trends[0].trend, "AI diagnostics");
        assert_eq!(findings.market_trends[0].impact_score, 85.0);
        assert_eq!(findings.emerging_technologies[0].adoption_rate, 62.5);
        assert_eq!(findings.funding_distribution[0].percentage, 40.0);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let value = json!({
            "market_trends": [{"trend": "X", "impact_score": "bad"}, {"trend": "Y", "impact_score": "70"}],
            "funding_distribution": [{"sector": "Payments"}, {"sector": "Lending", "percentage": "35%"}]
        });
        let findings = StructuredFindings::from_value(&value).unwrap();
        assert_eq!(findings.market_trends[0].impact_score, 50.0);
        assert_eq!(findings.market_trends[1].impact_score, 70.0);
        assert_eq!(findings.funding_distribution[0].percentage, 20.0);
        assert_eq!(findings.funding_distribution[1].percentage, 35.0);
        assert!(findings.emerging_technologies.is_empty());
    }

    #[test]
    fn test_missing_labels_are_numbered() {
        let value = json!({"emerging_technologies": [{"adoption_rate": 10}, {"adoption_rate": 20}]});
        let findings = StructuredFindings::from_value(&value).unwrap();
        assert_eq!(findings.emerging_technologies[1].technology, "Tech 2");
    }

    #[test]
    fn test_unrelated_objects_are_rejected() {
        assert!(StructuredFindings::from_value(&json!({"name": "llama3"})).is_none());
        assert!(StructuredFindings::from_value(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_percentages_are_not_normalized() {
        let value = json!({"funding_distribution": [{"sector": "A", "percentage": 80}, {"sector": "B", "percentage": 80}]});
        let findings = StructuredFindings::from_value(&value).unwrap();
        let total: f64 = findings.funding_distribution.iter().map(|f| f.percentage).sum();
        assert_eq!(total, 160.0);
    }
}
