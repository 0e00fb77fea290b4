//! HTTP server for the war room API.
//!
//! This module provides:
//! - Shared application state
//! - The axum router with session, auth and health routes
//! - Request tracing and CORS layers

mod auth_routes;
mod handlers;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::AnalysisEngine;
use crate::auth::TokenService;
use crate::config::Config;
use crate::llm::LlmClient;
use crate::research::ResearchEngine;
use crate::search::SearchClient;
use crate::sessions::SessionService;
use crate::storage::SqliteStorage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Session lifecycle operations.
    pub sessions: SessionService,
    /// Token issuing and verification.
    pub tokens: TokenService,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: SqliteStorage, llm: LlmClient, search: SearchClient) -> Self {
        let research = ResearchEngine::new(llm.clone(), search);
        let analysis = AnalysisEngine::new(llm);
        let tokens = TokenService::new(&config.auth);

        tracing::info!(
            auth_mode = ?config.auth.mode,
            model = %config.llm.model,
            "AppState initialized"
        );

        Self {
            config: Arc::new(config),
            sessions: SessionService::new(storage, research, analysis),
            tokens,
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        self.sessions.storage()
    }
}

/// Assemble the full application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(auth_routes::router())
        .merge(handlers::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
