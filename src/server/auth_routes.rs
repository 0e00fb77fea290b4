use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::auth::{bearer_token, find_mock_user, removal_cookie, session_cookie, MOCK_USERS};
use crate::config::AuthMode;
use crate::error::{AppError, AppResult, AuthError};
use crate::storage::{Storage, UserProfile};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/session", post(exchange_session))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/mock-users", get(mock_users))
        .route("/api/auth/mock-login", post(mock_login))
}

fn require_mock_mode(state: &AppState) -> AppResult<()> {
    if state.config.auth.mode != AuthMode::Mock {
        return Err(AppError::NotFound {
            resource: "Route".to_string(),
        });
    }
    Ok(())
}

/// POST /api/auth/session: trade a bearer token for the session cookie
async fn exchange_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingToken)?;
    let claims = state.tokens.verify(token)?;

    let profile = state
        .storage()
        .ensure_user_profile(&claims.sub, claims.email.as_deref())
        .await?;
    info!(user_id = %claims.sub, "Session cookie issued");

    let jar = jar.add(session_cookie(&state.config.auth.cookie_name, token.to_string()));
    Ok((
        jar,
        Json(json!({
            "user_id": claims.sub,
            "email": claims.email,
            "member_level": profile.member_level,
            "expires_at": claims.exp,
        })),
    ))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.remove(removal_cookie(&state.config.auth.cookie_name));
    (jar, Json(json!({ "ok": true })))
}

/// GET /api/auth/mock-users
async fn mock_users(State(state): State<AppState>) -> AppResult<Json<Value>> {
    require_mock_mode(&state)?;
    Ok(Json(json!({ "users": MOCK_USERS })))
}

#[derive(Debug, Deserialize)]
struct MockLoginRequest {
    user_id: String,
}

/// POST /api/auth/mock-login: sign in as one of the fixed local users
async fn mock_login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<MockLoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<Value>)> {
    require_mock_mode(&state)?;
    let Json(request) = body?;

    let user = find_mock_user(&request.user_id).ok_or_else(|| AppError::NotFound {
        resource: "Mock user".to_string(),
    })?;

    let profile = UserProfile::new(user.id)
        .with_email(user.email)
        .with_member_level(user.member_level);
    state.storage().upsert_user_profile(&profile).await?;

    let token = state.tokens.issue(user.id, Some(user.email))?;
    info!(user_id = user.id, "Mock login");

    let jar = jar.add(session_cookie(&state.config.auth.cookie_name, token.clone()));
    Ok((jar, Json(json!({ "user": user, "token": token }))))
}
