use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use super::{QueryGenerator, ResearchFindings, ResearchType, Synthesizer};
use crate::error::{AppError, AppResult};
use crate::idea::StructuredIdea;
use crate::llm::LlmClient;
use crate::search::{SearchClient, SearchResult};

/// Pipeline stage that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    QueryGeneration,
    Search,
    Synthesis,
}

/// Why a run came back degraded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Outcome class of a research run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every stage that ran completed.
    Succeeded,
    /// Search or synthesis failed and the findings were replaced with an empty list.
    Degraded,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Degraded => "degraded",
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "succeeded" => Ok(RunStatus::Succeeded),
            "degraded" => Ok(RunStatus::Degraded),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// Result of running the pipeline for one research type
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchRun {
    pub research_type: ResearchType,
    pub queries: Vec<String>,
    pub findings: ResearchFindings,
    pub status: RunStatus,
    pub failure: Option<StageFailure>,
    pub search_answer: Option<String>,
    pub search_errors: Vec<String>,
    /// Unique URLs handed to synthesis.
    pub sources_considered: usize,
}

impl ResearchRun {
    fn new(research_type: ResearchType, queries: Vec<String>) -> Self {
        Self {
            research_type,
            queries,
            findings: ResearchFindings::empty(research_type),
            status: RunStatus::Succeeded,
            failure: None,
            search_answer: None,
            search_errors: Vec::new(),
            sources_considered: 0,
        }
    }

    fn degrade(mut self, stage: Stage, err: &AppError) -> Self {
        self.status = RunStatus::Degraded;
        self.findings = ResearchFindings::empty(self.research_type);
        self.failure = Some(StageFailure {
            stage,
            message: err.to_string(),
        });
        self
    }

    /// Queries existed but nothing came out the other end.
    ///
    /// True for every degraded run, and also for runs where search simply
    /// found nothing usable.
    pub fn possibly_failed(&self) -> bool {
        self.status == RunStatus::Degraded || (!self.queries.is_empty() && self.findings.is_empty())
    }
}

/// Sequential research pipeline for a single research type
#[derive(Clone)]
pub struct ResearchEngine {
    queries: QueryGenerator,
    search: SearchClient,
    synthesizer: Synthesizer,
}

impl ResearchEngine {
    pub fn new(llm: LlmClient, search: SearchClient) -> Self {
        Self {
            queries: QueryGenerator::new(llm.clone()),
            search,
            synthesizer: Synthesizer::new(llm),
        }
    }

    /// Run the pipeline for `research_type`.
    ///
    /// Non-blank `reuse_queries` skip query generation. A query generation
    /// failure is returned as an error; search and synthesis failures produce
    /// a [`RunStatus::Degraded`] run with empty findings instead.
    pub async fn run(
        &self,
        idea: &StructuredIdea,
        research_type: ResearchType,
        reuse_queries: Option<Vec<String>>,
    ) -> AppResult<ResearchRun> {
        let start = Instant::now();

        let reused: Vec<String> = reuse_queries
            .unwrap_or_default()
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(research_type.max_queries())
            .collect();

        let queries = if reused.is_empty() {
            self.queries.generate(idea).await?.into_type(research_type)
        } else {
            info!(
                research_type = %research_type,
                queries = reused.len(),
                "Reusing previously generated queries"
            );
            reused
        };

        let mut run = ResearchRun::new(research_type, queries);
        if run.queries.is_empty() {
            info!(research_type = %research_type, "No queries for research type, skipping search");
            return Ok(run);
        }

        let response = match self.search.search(&run.queries, None).await {
            Ok(response) => response,
            Err(e) => {
                let err = AppError::from(e);
                warn!(research_type = %research_type, error = %err, "Search failed, continuing with empty results");
                return Ok(run.degrade(Stage::Search, &err));
            }
        };

        let results = response.unique_results();
        run.search_answer = response.answer;
        run.search_errors = response.errors;
        run.sources_considered = results.len();

        if results.is_empty() {
            info!(research_type = %research_type, "Search returned no results");
            return Ok(run);
        }

        match self.synthesize(idea, research_type, &results).await {
            Ok(findings) => run.findings = findings,
            Err(err) => {
                warn!(research_type = %research_type, error = %err, "Synthesis failed, continuing with empty results");
                run = run.degrade(Stage::Synthesis, &err);
            }
        }

        info!(
            research_type = %research_type,
            queries = run.queries.len(),
            sources = run.sources_considered,
            findings = run.findings.len(),
            status = ?run.status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Research run finished"
        );

        Ok(run)
    }

    async fn synthesize(
        &self,
        idea: &StructuredIdea,
        research_type: ResearchType,
        results: &[SearchResult],
    ) -> AppResult<ResearchFindings> {
        Ok(match research_type {
            ResearchType::Competitor => {
                ResearchFindings::Competitor(self.synthesizer.competitors(idea, results).await?)
            }
            ResearchType::Community => {
                ResearchFindings::Community(self.synthesizer.community(idea, results).await?)
            }
            ResearchType::Regulatory => {
                ResearchFindings::Regulatory(self.synthesizer.regulatory(idea, results).await?)
            }
        })
    }
}
