//! Authentication: HS256 bearer tokens, the session cookie, and the
//! `AuthUser` extractor every session route depends on.

mod mock;

pub use mock::{find_mock_user, MockUser, MOCK_USERS};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};
use crate::server::AppState;

/// JWT claims; `sub` is the user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_secs: config.token_ttl_secs,
        }
    }

    /// Sign a token for `user_id`
    pub fn issue(&self, user_id: &str, email: Option<&str>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AuthError::Signing {
                message: e.to_string(),
            }
        })
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            AuthError::InvalidToken {
                message: e.to_string(),
            }
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken {
                message: "token has no subject".to_string(),
            });
        }
        Ok(data.claims)
    }
}

/// Token from an `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// HTTP-only session cookie carrying `token`
pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Cookie that clears the session
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), "")).path("/").build()
}

/// Authenticated caller, taken from the bearer header or the session cookie
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(token) => token.to_string(),
            None => CookieJar::from_headers(&parts.headers)
                .get(&state.config.auth.cookie_name)
                .map(|cookie| cookie.value().to_string())
                .ok_or(AuthError::MissingToken)?,
        };

        let claims = state.tokens.verify(&token)?;
        Ok(claims.into())
    }
}
