use tracing::{debug, info};

use super::ResearchQueries;
use crate::error::AppResult;
use crate::idea::StructuredIdea;
use crate::json::parse_validated;
use crate::llm::LlmClient;
use crate::prompts::{query_generation_message, QUERY_GENERATION_PROMPT};

/// Turns a structured idea into category-bucketed search queries
#[derive(Clone)]
pub struct QueryGenerator {
    llm: LlmClient,
}

impl QueryGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Generate queries for all three research types in one LLM call.
    ///
    /// Any parse or schema failure is returned as an error.
    pub async fn generate(&self, idea: &StructuredIdea) -> AppResult<ResearchQueries> {
        let response = self
            .llm
            .complete_json(
                QUERY_GENERATION_PROMPT,
                query_generation_message(&idea.render_for_prompt()),
            )
            .await?;

        debug!(chars = response.content.len(), "Query generation response received");

        let queries: ResearchQueries = parse_validated(&response.content)?;

        info!(
            competitor = queries.competitor.len(),
            community = queries.community.len(),
            regulatory = queries.regulatory.len(),
            "Research queries generated"
        );

        Ok(queries)
    }
}
