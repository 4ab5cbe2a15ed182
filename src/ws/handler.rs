//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::NotifyError;

/// Query parameters of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Identity whose notifications the session receives.
    pub user_id: String,
}

/// `GET /ws?user_id=...`: Upgrade HTTP connection to WebSocket.
///
/// # Errors
///
/// Returns [`NotifyError::InvalidRequest`] if `user_id` is blank.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, NotifyError> {
    let user_id = UserId::parse(&params.user_id)?;
    let event_rx = state.event_bus.subscribe();
    let subscriptions = Arc::clone(&state.subscriptions);

    tracing::debug!(%user_id, "ws upgrade");
    Ok(ws.on_upgrade(move |socket| run_connection(socket, user_id, event_rx, subscriptions)))
}
