use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::idea::StructuredIdea;
use crate::research::ResearchType;
use crate::sessions::{QuotaInfo, ResearchStatus};
use crate::storage::{DamageReport, IdeaRecord, ResearchSnapshot, Session, SessionSummary};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/create", post(create_session))
        .route("/api/sessions/quota", get(get_quota))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/idea", post(submit_idea).get(get_idea))
        .route("/api/sessions/{id}/research", post(run_research))
        .route("/api/sessions/{id}/research/status", get(research_status))
        .route("/api/sessions/{id}/research/{research_type}", get(get_research))
        .route("/api/sessions/{id}/analyze", post(run_analysis))
        .route("/api/sessions/{id}/report", get(get_report))
}

/// GET /health
pub(super) async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn parse_research_type(raw: &str) -> AppResult<ResearchType> {
    raw.parse().map_err(|message| AppError::BadRequest {
        code: "INVALID_RESEARCH_TYPE".to_string(),
        message,
    })
}

/// GET /api/sessions: caller's sessions, newest first
async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<SessionSummary>>> {
    Ok(Json(state.sessions.list_sessions(&user.user_id).await?))
}

/// POST /api/sessions/create
async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<Value>)> {
    let session = state.sessions.create_session(&user.user_id).await?;
    let quota = state.sessions.quota(&user.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "session": session, "quota": quota })),
    ))
}

/// GET /api/sessions/quota
async fn get_quota(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<QuotaInfo>> {
    Ok(Json(state.sessions.quota(&user.user_id).await?))
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.sessions.get_session(&id, &user.user_id).await?))
}

/// POST /api/sessions/{id}/idea
async fn submit_idea(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IdeaRecord>)> {
    let Json(value) = body?;
    let idea: StructuredIdea = serde_json::from_value(value).map_err(|e| AppError::BadRequest {
        code: "INVALID_IDEA".to_string(),
        message: e.to_string(),
    })?;

    let record = state.sessions.submit_idea(&id, &user.user_id, idea).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/sessions/{id}/idea
async fn get_idea(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<IdeaRecord>> {
    Ok(Json(state.sessions.get_idea(&id, &user.user_id).await?))
}

#[derive(Debug, Deserialize)]
struct ResearchParams {
    #[serde(rename = "type")]
    research_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RunResearchBody {
    /// Queries from an earlier run; skips query generation.
    #[serde(default)]
    queries: Option<Vec<String>>,
}

/// An empty body means "generate fresh queries"
fn parse_research_body(body: &[u8]) -> AppResult<RunResearchBody> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunResearchBody::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        code: "INVALID_BODY".to_string(),
        message: e.to_string(),
    })
}

/// POST /api/sessions/{id}/research?type=competitor|community|regulatory
async fn run_research(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<ResearchParams>,
    body: Bytes,
) -> AppResult<Json<ResearchSnapshot>> {
    let raw = params.research_type.ok_or_else(|| AppError::BadRequest {
        code: "INVALID_RESEARCH_TYPE".to_string(),
        message: "Query parameter 'type' is required".to_string(),
    })?;
    let research_type = parse_research_type(&raw)?;
    let reuse = parse_research_body(&body)?.queries;

    let snapshot = state
        .sessions
        .run_research(&id, &user.user_id, research_type, reuse)
        .await?;
    Ok(Json(snapshot))
}

/// GET /api/sessions/{id}/research/status
async fn research_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ResearchStatus>> {
    Ok(Json(state.sessions.research_status(&id, &user.user_id).await?))
}

/// GET /api/sessions/{id}/research/{research_type}
async fn get_research(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, research_type)): Path<(String, String)>,
) -> AppResult<Json<ResearchSnapshot>> {
    let research_type = parse_research_type(&research_type)?;
    Ok(Json(
        state
            .sessions
            .get_research(&id, &user.user_id, research_type)
            .await?,
    ))
}

/// POST /api/sessions/{id}/analyze
async fn run_analysis(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DamageReport>> {
    Ok(Json(state.sessions.run_analysis(&id, &user.user_id).await?))
}

/// GET /api/sessions/{id}/report
async fn get_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DamageReport>> {
    Ok(Json(state.sessions.get_report(&id, &user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_research_type() {
        assert_eq!(parse_research_type("Community").unwrap(), ResearchType::Community);
        let err = parse_research_type("financial").unwrap_err();
        assert!(matches!(err, AppError::BadRequest { ref code, .. } if code == "INVALID_RESEARCH_TYPE"));
    }

    #[test]
    fn test_parse_research_body() {
        assert_eq!(parse_research_body(b"").unwrap().queries, None);
        assert_eq!(parse_research_body(b"  \n").unwrap().queries, None);
        assert_eq!(
            parse_research_body(br#"{"queries": ["a", "b"]}"#).unwrap().queries,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(parse_research_body(b"{not json").is_err());
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
