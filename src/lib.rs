//! # Idea War Room
//!
//! Backend for stress-testing startup ideas. A founder submits a structured
//! idea, optionally researches its competitive, community and regulatory
//! context, and receives a Multi-Vector Threat Analysis (MVTA) damage report.
//!
//! ## Features
//!
//! - **Idea intake**: language-aware validation of the structured submission
//! - **Research pipeline**: LLM query generation, multi-keyword web search,
//!   LLM synthesis into typed records, degrading to empty results on failure
//! - **MVTA analysis**: one schema-validated LLM call producing the damage report
//! - **Sessions**: ownership-checked lifecycle with per-tier creation quota
//! - **Auth**: HS256 bearer tokens exchanged for an HTTP-only cookie, plus a
//!   mock mode for local development
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → axum router → SessionService → ResearchEngine / AnalysisEngine
//!                                   ↓                    ↓
//!                             SQLite (state)     LLM + search APIs (HTTP)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use idea_war_room::{create_router, AppState, Config};
//! use idea_war_room::llm::LlmClient;
//! use idea_war_room::search::SearchClient;
//! use idea_war_room::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let llm = LlmClient::new(&config.llm, config.request.clone())?;
//!     let search = SearchClient::new(&config.search, config.request.clone())?;
//!     let addr = config.server.bind_addr.clone();
//!     let app = create_router(AppState::new(config, storage, llm, search));
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

/// MVTA report types and the analysis engine.
pub mod analysis;
/// Bearer tokens, session cookie and the `AuthUser` extractor.
pub mod auth;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Structured idea model and validation.
pub mod idea;
/// Parsing and validation of LLM JSON output.
pub mod json;
/// Chat-completion client.
pub mod llm;
/// Prompt templates for every LLM call.
pub mod prompts;
/// Research pipeline.
pub mod research;
/// Shared retry policy for outbound HTTP calls.
pub mod retry;
/// Web search client.
pub mod search;
/// HTTP router, handlers and shared state.
pub mod server;
/// Session lifecycle and quota.
pub mod sessions;
/// SQLite storage layer for persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{create_router, AppState};
