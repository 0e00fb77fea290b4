use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
}

/// Chat-completion provider configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Search provider configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_results: u32,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Outbound HTTP request configuration shared by the LLM and search clients
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `retry_delay_ms * n` before the next try.
    pub retry_delay_ms: u64,
}

/// How callers prove who they are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Bearer JWTs signed with `JWT_SECRET`.
    Jwt,
    /// Local development: self-signed tokens for a fixed user list.
    Mock,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub token_ttl_secs: i64,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

const MOCK_JWT_SECRET: &str = "idea-war-room-local-dev-secret";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let llm = LlmConfig {
            api_key: required("LLM_API_KEY")?,
            base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: parsed("LLM_TEMPERATURE", 0.7),
            max_tokens: parsed("LLM_MAX_TOKENS", 4000),
        };

        let search = SearchConfig {
            api_key: required("SEARCH_API_KEY")?,
            base_url: env::var("SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://api.search.example.com".to_string()),
            max_results: parsed("SEARCH_MAX_RESULTS", 5),
        };

        let database = DatabaseConfig::from_env();
        let logging = LoggingConfig::from_env();

        let request = RequestConfig {
            timeout_ms: parsed("REQUEST_TIMEOUT_MS", 60000),
            max_attempts: parsed("MAX_ATTEMPTS", 3),
            retry_delay_ms: parsed("RETRY_DELAY_MS", 1000),
        };

        let mode = match env::var("AUTH_MODE")
            .unwrap_or_else(|_| "jwt".to_string())
            .to_lowercase()
            .as_str()
        {
            "jwt" => AuthMode::Jwt,
            "mock" => AuthMode::Mock,
            other => {
                return Err(AppError::Config {
                    message: format!("AUTH_MODE must be 'jwt' or 'mock', got '{}'", other),
                })
            }
        };

        let jwt_secret = match (mode, env::var("JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (AuthMode::Mock, _) => MOCK_JWT_SECRET.to_string(),
            (AuthMode::Jwt, _) => {
                return Err(AppError::Config {
                    message: "JWT_SECRET is required when AUTH_MODE=jwt".to_string(),
                })
            }
        };

        let auth = AuthConfig {
            mode,
            jwt_secret,
            cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "war_room_session".to_string()),
            token_ttl_secs: parsed("TOKEN_TTL_SECS", 86400),
        };

        let server = ServerConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        };

        Ok(Config {
            llm,
            search,
            database,
            logging,
            request,
            auth,
            server,
        })
    }
}

impl DatabaseConfig {
    /// Read only the database settings; needs no API keys
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/war_room.db".to_string()),
            ),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }
}

fn required(key: &str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config {
            message: format!("{} is required", key),
        }),
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Mock,
            jwt_secret: MOCK_JWT_SECRET.to_string(),
            cookie_name: "war_room_session".to_string(),
            token_ttl_secs: 86400,
        }
    }
}
