use std::time::Instant;
use tracing::{debug, info};

use super::MvtaReport;
use crate::error::AppResult;
use crate::idea::StructuredIdea;
use crate::json::parse_validated;
use crate::llm::LlmClient;
use crate::prompts::{analysis_message, MVTA_ANALYSIS_PROMPT};
use crate::research::ResearchFindings;

/// Research already gathered for a session
#[derive(Debug, Clone, Default)]
pub struct ResearchContext {
    pub findings: Vec<ResearchFindings>,
}

/// Runs the MVTA prompt against a structured idea
#[derive(Clone)]
pub struct AnalysisEngine {
    llm: LlmClient,
}

impl AnalysisEngine {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Produce a validated damage report.
    ///
    /// `research` is accepted but not sent to the model; analysis runs
    /// independently of research results.
    pub async fn analyze(
        &self,
        idea: &StructuredIdea,
        research: Option<&ResearchContext>,
    ) -> AppResult<MvtaReport> {
        let start = Instant::now();
        if let Some(context) = research {
            debug!(
                research_sets = context.findings.len(),
                "Research context supplied to analysis and ignored"
            );
        }

        let response = self
            .llm
            .complete_json(MVTA_ANALYSIS_PROMPT, analysis_message(&idea.render_for_prompt()))
            .await?;

        let report: MvtaReport = parse_validated(&response.content)?;

        info!(
            vulnerabilities = report.vulnerabilities.len(),
            cascading_failures = report.cascading_failures.len(),
            recommendations = report.recommendations.len(),
            overall_score = report.overall_score(),
            completion_tokens = response.usage.completion_tokens,
            latency_ms = start.elapsed().as_millis() as u64,
            "MVTA analysis completed"
        );

        Ok(report)
    }
}
