//! `POST /ai-agent`: one chat turn.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::agent_core::orchestrator::ChatTurn;
use crate::agent_core::types::ChatRequest;
use crate::agent_core::AgentError;

use super::auth::{bearer_token, token_fingerprint, AuthError};
use super::AppState;

pub async fn handle_chat(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable chat request body");
            return error_response(&AgentError::MissingMessage);
        }
    };
    let message = match request.message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m,
        _ => return error_response(&AgentError::MissingMessage),
    };

    let token = bearer_token(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    );
    let (token, user_id) = match authenticate(&state, token).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "authentication failed");
            return error_response(&AgentError::AuthenticationRequired);
        }
    };

    let turn = ChatTurn {
        store: state.stores.for_user_token(token),
        user_id: &user_id,
        today: chrono::Local::now().date_naive(),
        message,
        history: &request.history,
    };
    match state.orchestrator.handle(turn).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chat request failed");
            error_response(&e)
        }
    }
}

async fn authenticate<'t>(state: &AppState, token: Option<&'t str>) -> Result<(&'t str, String), AuthError> {
    let token = token.ok_or(AuthError::MissingCredential)?;
    match state.identity.resolve(token).await {
        Ok(user_id) => Ok((token, user_id)),
        Err(e) => {
            tracing::warn!(token = %token_fingerprint(token), error = %e, "token rejected");
            Err(e)
        }
    }
}

fn error_response(err: &AgentError) -> Response {
    let status = match err {
        AgentError::MissingMessage => StatusCode::BAD_REQUEST,
        AgentError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
