//! Multi-Vector Threat Analysis (MVTA).
//!
//! One LLM call attacks the idea from five fixed vectors and returns a
//! damage report. Unlike research, any malformed or out-of-schema output is
//! a hard failure.

mod engine;

pub use engine::{AnalysisEngine, ResearchContext};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::LlmOutputError;
use crate::json::{check_count, check_score, check_text, validate_each, Validate};

/// Minimum number of vulnerabilities in a report
pub const MIN_VULNERABILITIES: usize = 10;
/// Maximum number of cascading failure chains
pub const MAX_CASCADING_FAILURES: usize = 5;

/// Threat vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatVector {
    Technical,
    Market,
    Social,
    Legal,
    Narrative,
}

impl ThreatVector {
    pub const ALL: [ThreatVector; 5] = [
        ThreatVector::Technical,
        ThreatVector::Market,
        ThreatVector::Social,
        ThreatVector::Legal,
        ThreatVector::Narrative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatVector::Technical => "technical",
            ThreatVector::Market => "market",
            ThreatVector::Social => "social",
            ThreatVector::Legal => "legal",
            ThreatVector::Narrative => "narrative",
        }
    }
}

impl fmt::Display for ThreatVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weakness found along one vector. `score` runs 1 (catastrophic) to 5 (resilient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub vector: ThreatVector,
    pub title: String,
    pub description: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Likelihood {
    High,
    Medium,
    Low,
}

/// An ordered chain of failures set off by one trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadingFailure {
    pub trigger: String,
    pub chain: Vec<String>,
    pub final_outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likelihood: Option<Likelihood>,
}

/// Overall verdict for one vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSynthesis {
    pub vector: ThreatVector,
    pub score: u8,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// A prioritized action for the founder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub addresses: Vec<ThreatVector>,
}

/// The damage report produced by one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvtaReport {
    pub executive_summary: String,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub cascading_failures: Vec<CascadingFailure>,
    pub vector_synthesis: Vec<VectorSynthesis>,
    pub recommendations: Vec<Recommendation>,
}

impl MvtaReport {
    /// Mean of the per-vector synthesis scores
    pub fn overall_score(&self) -> f64 {
        if self.vector_synthesis.is_empty() {
            return 0.0;
        }
        let total: u32 = self.vector_synthesis.iter().map(|v| v.score as u32).sum();
        total as f64 / self.vector_synthesis.len() as f64
    }

    /// Vulnerabilities found along one vector
    pub fn vulnerabilities_for(&self, vector: ThreatVector) -> impl Iterator<Item = &Vulnerability> {
        self.vulnerabilities.iter().filter(move |v| v.vector == vector)
    }
}

impl Validate for Vulnerability {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("title", &self.title)?;
        check_text("description", &self.description)?;
        check_score("score", self.score)
    }
}

impl Validate for CascadingFailure {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("trigger", &self.trigger)?;
        check_count("chain", self.chain.len(), 2, usize::MAX)?;
        for (i, step) in self.chain.iter().enumerate() {
            check_text(&format!("chain[{}]", i), step)?;
        }
        check_text("final_outcome", &self.final_outcome)
    }
}

impl Validate for VectorSynthesis {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_score("score", self.score)?;
        check_text("summary", &self.summary)
    }
}

impl Validate for Recommendation {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("title", &self.title)?;
        check_text("description", &self.description)
    }
}

impl Validate for MvtaReport {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("executive_summary", &self.executive_summary)?;

        check_count(
            "vulnerabilities",
            self.vulnerabilities.len(),
            MIN_VULNERABILITIES,
            usize::MAX,
        )?;
        validate_each("vulnerabilities", &self.vulnerabilities)?;
        let covered: HashSet<ThreatVector> =
            self.vulnerabilities.iter().map(|v| v.vector).collect();
        if let Some(missing) = ThreatVector::ALL.iter().find(|v| !covered.contains(v)) {
            return Err(LlmOutputError::schema(
                "vulnerabilities",
                format!("no vulnerability for the {} vector", missing),
            ));
        }

        check_count(
            "cascading_failures",
            self.cascading_failures.len(),
            0,
            MAX_CASCADING_FAILURES,
        )?;
        validate_each("cascading_failures", &self.cascading_failures)?;

        check_count(
            "vector_synthesis",
            self.vector_synthesis.len(),
            ThreatVector::ALL.len(),
            ThreatVector::ALL.len(),
        )?;
        validate_each("vector_synthesis", &self.vector_synthesis)?;
        let mut seen = HashSet::new();
        for entry in &self.vector_synthesis {
            if !seen.insert(entry.vector) {
                return Err(LlmOutputError::schema(
                    "vector_synthesis",
                    format!("duplicate entry for the {} vector", entry.vector),
                ));
            }
        }

        check_count("recommendations", self.recommendations.len(), 5, 10)?;
        validate_each("recommendations", &self.recommendations)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::{json, Value};

    /// A report JSON that passes validation
    pub fn valid_report_json() -> Value {
        let vectors = ["technical", "market", "social", "legal", "narrative"];
        let vulnerabilities: Vec<Value> = (0..10)
            .map(|i| {
                json!({
                    "vector": vectors[i % 5],
                    "title": format!("Weakness {}", i),
                    "description": "The idea breaks here",
                    "score": (i % 5) + 1
                })
            })
            .collect();
        let synthesis: Vec<Value> = vectors
            .iter()
            .map(|v| json!({"vector": v, "score": 3, "summary": "Mixed"}))
            .collect();
        let recommendations: Vec<Value> = (0..5)
            .map(|i| {
                json!({
                    "priority": if i == 0 { "critical" } else { "medium" },
                    "title": format!("Action {}", i),
                    "description": "Do this next",
                    "addresses": ["market"]
                })
            })
            .collect();

        json!({
            "executive_summary": "Fragile on market and legal fronts.",
            "vulnerabilities": vulnerabilities,
            "cascading_failures": [{
                "trigger": "Walker no-show",
                "chain": ["Bad review", "Churn spike"],
                "final_outcome": "Marketplace liquidity collapses",
                "likelihood": "medium"
            }],
            "vector_synthesis": synthesis,
            "recommendations": recommendations
        })
    }

    pub fn valid_report() -> MvtaReport {
        serde_json::from_value(valid_report_json()).expect("fixture report deserializes")
    }
}
