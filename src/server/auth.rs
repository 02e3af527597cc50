//! Bearer-token authentication
//!
//! Identity verification is an external collaborator's job; the server
//! only needs a token-to-user mapping. [`TokenTableVerifier`] is the
//! shipped implementation for tests and self-hosted setups.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::{AppState, ServerError};

/// Maps a presented bearer token to a user id, or rejects it.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<String>;
}

/// Static token table: `token -> user id`.
#[derive(Debug, Default)]
pub struct TokenTableVerifier {
    tokens: HashMap<String, String>,
}

impl TokenTableVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Parse `token = "user-id"` lines from a TOML-ish token file.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: pairs.into_iter().collect(),
        }
    }
}

impl IdentityVerifier for TokenTableVerifier {
    fn verify(&self, token: &str) -> Option<String> {
        self.tokens.get(token).cloned()
    }
}

/// Extractor yielding the verified user id; rejects with 401 when the
/// bearer token is absent or unknown.
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        token
            .and_then(|t| state.verifier.verify(t))
            .map(AuthUser)
            .ok_or(ServerError::Unauthorized)
    }
}
