//! Reference implementation of the remote API
//!
//! An axum server exposing the authenticated per-user document store
//! the sync engine talks to. Deck reconciliation reuses
//! [`crate::sync::merge`], so both sides of a sync run the same
//! algorithm.

pub mod auth;
mod routes;
mod store;

use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;

pub use auth::{IdentityVerifier, TokenTableVerifier};
pub use store::ServerStore;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Storage(_) | ServerError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {self}");
        }
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Writes are serialized through this mutex; together with per-batch
    /// transactions that gives the sync endpoint its all-or-nothing
    /// guarantee.
    pub store: Arc<Mutex<ServerStore>>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(store: ServerStore, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            verifier,
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> axum::Router {
    routes::router(state).layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, bind: &str) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
