//! Session authentication.
//!
//! The identity provider signs an HS256 session token carrying the user id and
//! subscription plan. It arrives as `Authorization: Bearer <token>` or, for
//! browser requests (including WebSocket upgrades), as the `__session` cookie.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum::http::{header, HeaderMap};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

const SESSION_COOKIE: &str = "__session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    /// Unknown or missing plans are treated as free.
    pub fn from_claim(plan: Option<&str>) -> Self {
        match plan.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("pro") | Some("premium") => Plan::Pro,
            _ => Plan::Free,
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub plan: Plan,
    pub name: Option<String>,
}

impl AuthUser {
    /// Paid entitlement: bypasses the free-tier quota.
    pub fn entitled(&self) -> bool {
        self.plan == Plan::Pro
    }
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        AuthUser {
            plan: Plan::from_claim(claims.plan.as_deref()),
            user_id: claims.sub,
            name: claims.name,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token presented")]
    MissingToken,

    #[error("session token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("session token has an empty subject")]
    EmptySubject,
}

pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, AuthError> {
    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    if data.claims.sub.trim().is_empty() {
        return Err(AuthError::EmptySubject);
    }
    Ok(data.claims)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty())
}

pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers)
        .or_else(|| session_cookie(headers))
        .ok_or(AuthError::MissingToken)?;
    Ok(verify_token(token, secret)?.into())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authenticate(&parts.headers, &state.config.session_jwt_secret).map_err(|e| {
            debug!("Rejecting request: {e}");
            AppError::Unauthorized
        })
    }
}
