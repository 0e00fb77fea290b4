use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::sessions::QuotaInfo;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("LLM output rejected: {0}")]
    LlmOutput(#[from] LlmOutputError),

    #[error("{0}")]
    Idea(#[from] IdeaValidationError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Missing resources and ownership mismatches share this variant so a
    /// caller can never tell the two apart.
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Bad request: {message}")]
    BadRequest { code: String, message: String },

    #[error("Session quota exceeded ({} of {} used)", quota.used, quota.limit.map(|l| l.to_string()).unwrap_or_else(|| "unlimited".to_string()))]
    QuotaExceeded { quota: QuotaInfo },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Stored payload is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Chat-completion provider errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,

    #[error("LLM unavailable: {message} (attempts: {attempts})")]
    Unavailable { message: String, attempts: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Search provider errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key is not configured")]
    MissingApiKey,

    #[error("Search unavailable: {message} (attempts: {attempts})")]
    Unavailable { message: String, attempts: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Rejections of model output that did not match the expected shape
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LlmOutputError {
    #[error("Response is not valid JSON: {message}")]
    Parse { message: String },

    #[error("Schema violation at {path}: {message}")]
    Schema { path: String, message: String },
}

impl LlmOutputError {
    /// Build a schema violation for a field path
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        LlmOutputError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One failed field in a submitted idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Structured idea validation errors
#[derive(Debug, Error)]
pub enum IdeaValidationError {
    #[error("Invalid idea: {} field(s) failed validation", violations.len())]
    Invalid { violations: Vec<FieldViolation> },
}

impl IdeaValidationError {
    /// The individual field failures
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            IdeaValidationError::Invalid { violations } => violations,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingToken,

    #[error("invalid token: {message}")]
    InvalidToken { message: String },

    #[error("token signing failed: {message}")]
    Signing { message: String },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for search operations
pub type SearchApiResult<T> = Result<T, SearchError>;

impl AppError {
    /// Generic not-found for a session, used for both missing and foreign sessions
    pub fn session_not_found() -> Self {
        AppError::NotFound {
            resource: "Session".to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &str) {
        match self {
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Idea(_) => (StatusCode::BAD_REQUEST, "INVALID_IDEA"),
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, code.as_str()),
            AppError::QuotaExceeded { .. } => (StatusCode::FORBIDDEN, "QUOTA_EXCEEDED"),
            AppError::Auth(AuthError::Signing { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Llm(_) | AppError::Search(_) | AppError::LlmOutput(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_FAILED")
            }
            AppError::Storage(_) | AppError::Config { .. } | AppError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            code: "INVALID_BODY".to_string(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self, code, "Request failed");
        }

        let mut body = json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        });

        match &self {
            AppError::Idea(err) => {
                body["error"]["details"] = json!(err.violations());
            }
            AppError::QuotaExceeded { quota } => {
                body["quota"] = json!(quota);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        assert_eq!(AppError::session_not_found().to_string(), "Session not found");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Unavailable {
            message: "server down".to_string(),
            attempts: 3,
        };
        assert_eq!(err.to_string(), "LLM unavailable: server down (attempts: 3)");

        let err = LlmError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - Invalid API key");

        let err = LlmError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_llm_output_error_display() {
        let err = LlmOutputError::Parse {
            message: "expected value".to_string(),
        };
        assert_eq!(err.to_string(), "Response is not valid JSON: expected value");

        let err = LlmOutputError::schema("competitors[0].url", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Schema violation at competitors[0].url: must not be empty"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::session_not_found().status_and_code().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Auth(AuthError::MissingToken).status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Llm(LlmError::MissingApiKey).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_FAILED")
        );
        let err = AppError::BadRequest {
            code: "INVALID_RESEARCH_TYPE".to_string(),
            message: "unknown".to_string(),
        };
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "INVALID_RESEARCH_TYPE")
        );
    }

    #[test]
    fn test_quota_exceeded_maps_to_forbidden() {
        let err = AppError::QuotaExceeded {
            quota: QuotaInfo::new(0, 2),
        };
        assert_eq!(err.status_and_code().0, StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Session quota exceeded (2 of 2 used)");
    }

    #[test]
    fn test_idea_error_exposes_violations() {
        let err = IdeaValidationError::Invalid {
            violations: vec![FieldViolation {
                field: "high_concept".to_string(),
                message: "too short".to_string(),
            }],
        };
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.to_string(), "Invalid idea: 1 field(s) failed validation");
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let storage_err = StorageError::Query {
            message: "syntax error".to_string(),
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
