//! Identity resolution: bearer token → user id.
//!
//! The hosted deployment asks the auth API who owns the token. Local SQLite
//! runs use a fixed token table from config.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::StaticToken;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer token supplied")]
    MissingCredential,

    #[error("token rejected by auth service (HTTP {status})")]
    Rejected { status: u16 },

    #[error("token not recognized")]
    UnknownToken,

    #[error("auth service unreachable at {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("auth service returned an unreadable user: {reason}")]
    MalformedUser { reason: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::Transport {
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: e.to_string(),
        }
    }
}

/// Short SHA-256 fingerprint of a token, safe to log.
pub fn token_fingerprint(token: &str) -> String {
    let hash = Sha256::digest(token.as_bytes());
    let hex = format!("{hash:x}");
    hex[..12].to_string()
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ─── Resolver seam ──────────────────────────────────────────────────────────

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// The user id owning `token`.
    async fn resolve(&self, token: &str) -> Result<String, AuthError>;
}

// ─── Hosted auth API ────────────────────────────────────────────────────────

/// Resolves tokens with `GET {endpoint}/auth/v1/user`.
pub struct GoTrueResolver {
    http: HttpClient,
    endpoint: String,
    api_key: String,
}

impl GoTrueResolver {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport {
                url: endpoint.to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityResolver for GoTrueResolver {
    async fn resolve(&self, token: &str) -> Result<String, AuthError> {
        let url = format!("{}/auth/v1/user", self.endpoint);
        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let user: serde_json::Value = response.json().await.map_err(|e| AuthError::MalformedUser {
            reason: e.to_string(),
        })?;
        user.get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AuthError::MalformedUser {
                reason: "missing id".into(),
            })
    }
}

// ─── Static tokens ──────────────────────────────────────────────────────────

/// Fixed token → user map for local runs.
pub struct StaticTokenResolver {
    tokens: HashMap<String, String>,
}

impl StaticTokenResolver {
    pub fn new(tokens: &[StaticToken]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|t| (t.token.clone(), t.user_id.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Result<String, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::UnknownToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(Some("bearer   xyz ")), Some("xyz"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = token_fingerprint("secret-token");
        assert_eq!(a.len(), 12);
        assert_eq!(a, token_fingerprint("secret-token"));
        assert_ne!(a, token_fingerprint("other-token"));
        assert!(!a.contains("secret"));
    }

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticTokenResolver::new(&[StaticToken {
            token: "dev-token".into(),
            user_id: "user-1".into(),
        }]);
        assert_eq!(resolver.resolve("dev-token").await.unwrap(), "user-1");
        assert!(matches!(
            resolver.resolve("nope").await,
            Err(AuthError::UnknownToken)
        ));
    }
}
