//! HTTP surface: routes, shared state and middleware.

pub mod auth;
pub mod chat;

use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent_core::catalog::CATALOG_VERSION;
use crate::agent_core::Orchestrator;
use crate::store::StoreProvider;

use auth::IdentityResolver;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub identity: Arc<dyn IdentityResolver>,
    pub stores: Arc<dyn StoreProvider>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/ai-agent", post(chat::handle_chat))
        .route("/", post(chat::handle_chat))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "catalogVersion": CATALOG_VERSION }))
}
