//! Market research pipeline: query generation, search, and synthesis.
//!
//! Each research type runs independently through
//! `queries generated -> searched -> synthesized -> snapshot ready`.

mod engine;
mod queries;
mod synthesis;

pub use engine::{ResearchEngine, ResearchRun, RunStatus, Stage, StageFailure};
pub use queries::QueryGenerator;
pub use synthesis::{format_results, Synthesizer};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LlmOutputError;
use crate::json::{check_count, check_text, Validate};

/// Research category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchType {
    Competitor,
    Community,
    Regulatory,
}

impl ResearchType {
    /// Every research type, in display order
    pub const ALL: [ResearchType; 3] = [
        ResearchType::Competitor,
        ResearchType::Community,
        ResearchType::Regulatory,
    ];

    /// Stable lowercase name used in URLs and storage
    pub fn as_str(self) -> &'static str {
        match self {
            ResearchType::Competitor => "competitor",
            ResearchType::Community => "community",
            ResearchType::Regulatory => "regulatory",
        }
    }

    /// Most queries a run of this type may carry
    pub fn max_queries(self) -> usize {
        match self {
            ResearchType::Competitor | ResearchType::Community => 10,
            ResearchType::Regulatory => 5,
        }
    }
}

impl fmt::Display for ResearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "competitor" => Ok(ResearchType::Competitor),
            "community" => Ok(ResearchType::Community),
            "regulatory" => Ok(ResearchType::Regulatory),
            _ => Err(format!("Unknown research type: {}", s)),
        }
    }
}

/// Search queries per category, as produced by the query generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQueries {
    pub competitor: Vec<String>,
    pub community: Vec<String>,
    #[serde(default)]
    pub regulatory: Vec<String>,
}

impl ResearchQueries {
    /// Queries for one research type
    pub fn for_type(&self, research_type: ResearchType) -> &[String] {
        match research_type {
            ResearchType::Competitor => &self.competitor,
            ResearchType::Community => &self.community,
            ResearchType::Regulatory => &self.regulatory,
        }
    }

    /// Move out the queries for one research type
    pub fn into_type(self, research_type: ResearchType) -> Vec<String> {
        match research_type {
            ResearchType::Competitor => self.competitor,
            ResearchType::Community => self.community,
            ResearchType::Regulatory => self.regulatory,
        }
    }
}

impl Validate for ResearchQueries {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_count(
            "competitor",
            self.competitor.len(),
            3,
            ResearchType::Competitor.max_queries(),
        )?;
        check_count(
            "community",
            self.community.len(),
            3,
            ResearchType::Community.max_queries(),
        )?;
        check_count(
            "regulatory",
            self.regulatory.len(),
            0,
            ResearchType::Regulatory.max_queries(),
        )?;
        for research_type in ResearchType::ALL {
            for (i, query) in self.for_type(research_type).iter().enumerate() {
                check_text(&format!("{}[{}]", research_type, i), query)?;
            }
        }
        Ok(())
    }
}

/// A competing company or product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_position: Option<String>,
}

/// Where a community signal was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Reddit,
    Ycombinator,
    Forum,
    ReviewSite,
}

/// Tone of a community discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// A real-user discussion relevant to the idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySignal {
    pub source: SignalSource,
    pub title: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<String>,
}

/// How hard a regulation bites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// A law or compliance obligation affecting the idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorySignal {
    pub regulation: String,
    pub jurisdiction: String,
    pub summary: String,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Validate for Competitor {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("name", &self.name)?;
        check_text("description", &self.description)?;
        check_text("url", &self.url)
    }
}

impl Validate for CommunitySignal {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("title", &self.title)?;
        check_text("summary", &self.summary)?;
        check_text("url", &self.url)
    }
}

impl Validate for RegulatorySignal {
    fn validate(&self) -> Result<(), LlmOutputError> {
        check_text("regulation", &self.regulation)?;
        check_text("jurisdiction", &self.jurisdiction)?;
        check_text("summary", &self.summary)
    }
}

/// Synthesized records for one research type.
///
/// Serializes as a bare array; use [`ResearchFindings::from_json`] to read
/// one back since the array alone does not say which type it holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResearchFindings {
    Competitor(Vec<Competitor>),
    Community(Vec<CommunitySignal>),
    Regulatory(Vec<RegulatorySignal>),
}

impl ResearchFindings {
    /// No findings for the given type
    pub fn empty(research_type: ResearchType) -> Self {
        match research_type {
            ResearchType::Competitor => ResearchFindings::Competitor(Vec::new()),
            ResearchType::Community => ResearchFindings::Community(Vec::new()),
            ResearchType::Regulatory => ResearchFindings::Regulatory(Vec::new()),
        }
    }

    /// Decode a stored array for the given type
    pub fn from_json(
        research_type: ResearchType,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match research_type {
            ResearchType::Competitor => ResearchFindings::Competitor(serde_json::from_value(value)?),
            ResearchType::Community => ResearchFindings::Community(serde_json::from_value(value)?),
            ResearchType::Regulatory => ResearchFindings::Regulatory(serde_json::from_value(value)?),
        })
    }

    /// Which type these findings belong to
    pub fn research_type(&self) -> ResearchType {
        match self {
            ResearchFindings::Competitor(_) => ResearchType::Competitor,
            ResearchFindings::Community(_) => ResearchType::Community,
            ResearchFindings::Regulatory(_) => ResearchType::Regulatory,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResearchFindings::Competitor(items) => items.len(),
            ResearchFindings::Community(items) => items.len(),
            ResearchFindings::Regulatory(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_max_queries_per_type() {
        assert_eq!(ResearchType::Competitor.max_queries(), 10);
        assert_eq!(ResearchType::Community.max_queries(), 10);
        assert_eq!(ResearchType::Regulatory.max_queries(), 5);
    }

    fn queries(competitor: usize, community: usize, regulatory: usize) -> ResearchQueries {
        let make = |prefix: &str, n: usize| (0..n).map(|i| format!("{} {}", prefix, i)).collect();
        ResearchQueries {
            competitor: make("competitor", competitor),
            community: make("community", community),
            regulatory: make("regulatory", regulatory),
        }
    }

    #[test]
    fn test_research_type_round_trip() {
        for research_type in ResearchType::ALL {
            assert_eq!(
                research_type.as_str().parse::<ResearchType>().unwrap(),
                research_type
            );
        }
        assert!("market".parse::<ResearchType>().is_err());
        assert_eq!("Competitor".parse::<ResearchType>().unwrap(), ResearchType::Competitor);
    }

    #[test]
    fn test_query_bounds() {
        assert!(queries(3, 3, 0).validate().is_ok());
        assert!(queries(10, 10, 5).validate().is_ok());
        assert!(queries(2, 3, 0).validate().is_err());
        assert!(queries(3, 11, 0).validate().is_err());
        assert!(queries(3, 3, 6).validate().is_err());
    }

    #[test]
    fn test_blank_query_rejected() {
        let mut q = queries(3, 3, 1);
        q.regulatory[0] = "  ".to_string();
        assert_eq!(
            q.validate().unwrap_err(),
            LlmOutputError::schema("regulatory[0]", "must not be empty")
        );
    }

    #[test]
    fn test_regulatory_defaults_to_empty() {
        let q: ResearchQueries = serde_json::from_value(json!({
            "competitor": ["a", "b", "c"],
            "community": ["d", "e", "f"]
        }))
        .unwrap();
        assert!(q.regulatory.is_empty());
        assert_eq!(q.for_type(ResearchType::Community).len(), 3);
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        let bad = json!({
            "source": "twitter",
            "title": "t",
            "summary": "s",
            "sentiment": "neutral",
            "url": "u"
        });
        assert!(serde_json::from_value::<CommunitySignal>(bad).is_err());

        let bad = json!({
            "source": "review_site",
            "title": "t",
            "summary": "s",
            "sentiment": "angry",
            "url": "u"
        });
        assert!(serde_json::from_value::<CommunitySignal>(bad).is_err());
    }

    #[test]
    fn test_findings_serialize_as_bare_array() {
        let findings = ResearchFindings::Regulatory(vec![RegulatorySignal {
            regulation: "GDPR".to_string(),
            jurisdiction: "EU".to_string(),
            summary: "Personal data rules".to_string(),
            impact: Impact::High,
            url: None,
        }]);
        let value = serde_json::to_value(&findings).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["impact"], "high");

        let back = ResearchFindings::from_json(ResearchType::Regulatory, value).unwrap();
        assert_eq!(back, findings);
    }

    #[test]
    fn test_empty_findings_keep_their_type() {
        let back = ResearchFindings::from_json(ResearchType::Community, json!([])).unwrap();
        assert_eq!(back.research_type(), ResearchType::Community);
        assert!(back.is_empty());
    }
}
