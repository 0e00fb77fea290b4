use serde::Deserialize;
use std::fmt::Write as _;
use tracing::info;

use super::{CommunitySignal, Competitor, RegulatorySignal};
use crate::error::{AppResult, LlmOutputError};
use crate::idea::StructuredIdea;
use crate::json::{parse_validated, validate_each, Validate};
use crate::llm::LlmClient;
use crate::prompts::{
    synthesis_message, COMMUNITY_SYNTHESIS_PROMPT, COMPETITOR_SYNTHESIS_PROMPT,
    REGULATORY_SYNTHESIS_PROMPT,
};
use crate::search::SearchResult;

/// Snippets longer than this are cut before being sent to the model.
const MAX_SNIPPET_CHARS: usize = 800;

#[derive(Debug, Deserialize)]
struct CompetitorEnvelope {
    competitors: Vec<Competitor>,
}

#[derive(Debug, Deserialize)]
struct CommunityEnvelope {
    signals: Vec<CommunitySignal>,
}

#[derive(Debug, Deserialize)]
struct RegulatoryEnvelope {
    signals: Vec<RegulatorySignal>,
}

impl Validate for CompetitorEnvelope {
    fn validate(&self) -> Result<(), LlmOutputError> {
        validate_each("competitors", &self.competitors)
    }
}

impl Validate for CommunityEnvelope {
    fn validate(&self) -> Result<(), LlmOutputError> {
        validate_each("signals", &self.signals)
    }
}

impl Validate for RegulatoryEnvelope {
    fn validate(&self) -> Result<(), LlmOutputError> {
        validate_each("signals", &self.signals)
    }
}

/// Turns raw search hits into typed research records, one LLM call per category
#[derive(Clone)]
pub struct Synthesizer {
    llm: LlmClient,
}

impl Synthesizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Extract competitors from search hits
    pub async fn competitors(
        &self,
        idea: &StructuredIdea,
        results: &[SearchResult],
    ) -> AppResult<Vec<Competitor>> {
        let text = self.call(COMPETITOR_SYNTHESIS_PROMPT, idea, results).await?;
        let envelope: CompetitorEnvelope = parse_validated(&text)?;
        info!(competitors = envelope.competitors.len(), "Competitors synthesized");
        Ok(envelope.competitors)
    }

    /// Extract community discussion signals from search hits
    pub async fn community(
        &self,
        idea: &StructuredIdea,
        results: &[SearchResult],
    ) -> AppResult<Vec<CommunitySignal>> {
        let text = self.call(COMMUNITY_SYNTHESIS_PROMPT, idea, results).await?;
        let envelope: CommunityEnvelope = parse_validated(&text)?;
        info!(signals = envelope.signals.len(), "Community signals synthesized");
        Ok(envelope.signals)
    }

    /// Extract regulatory obligations from search hits
    pub async fn regulatory(
        &self,
        idea: &StructuredIdea,
        results: &[SearchResult],
    ) -> AppResult<Vec<RegulatorySignal>> {
        let text = self.call(REGULATORY_SYNTHESIS_PROMPT, idea, results).await?;
        let envelope: RegulatoryEnvelope = parse_validated(&text)?;
        info!(signals = envelope.signals.len(), "Regulatory signals synthesized");
        Ok(envelope.signals)
    }

    async fn call(
        &self,
        prompt: &str,
        idea: &StructuredIdea,
        results: &[SearchResult],
    ) -> AppResult<String> {
        let message = synthesis_message(&idea.render_for_prompt(), &format_results(results));
        let response = self.llm.complete_json(prompt, message).await?;
        Ok(response.content)
    }
}

/// Render search hits as a numbered list for a prompt
pub fn format_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", i + 1, result.title);
        let _ = writeln!(out, "URL: {}", result.url);
        if let Some(date) = &result.published_date {
            let _ = writeln!(out, "Published: {}", date);
        }
        let snippet: String = result.content.chars().take(MAX_SNIPPET_CHARS).collect();
        let _ = writeln!(out, "{}\n", snippet.trim());
    }
    out
}
