//! Class handlers: point lookup and administrative removal.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ClassDto, UriQuery};
use crate::app_state::AppState;
use crate::domain::ClassUri;
use crate::error::NotifyError;

/// `GET /classes?uri=...`: Latest stored snapshot of a class.
///
/// # Errors
///
/// Returns [`NotifyError::NotFound`] if nobody has subscribed to the URI.
pub async fn get_class(
    State(state): State<AppState>,
    Query(query): Query<UriQuery>,
) -> Result<impl IntoResponse, NotifyError> {
    let uri = ClassUri::parse(&query.uri)?;
    let event = state.subscriptions.get_class(&uri).await?;
    Ok(Json(ClassDto::from(event)))
}

/// `DELETE /classes?uri=...`: Drop a stale or invalid class.
///
/// # Errors
///
/// Returns [`NotifyError::NotFound`] if the class does not exist.
pub async fn delete_class(
    State(state): State<AppState>,
    Query(query): Query<UriQuery>,
) -> Result<impl IntoResponse, NotifyError> {
    let uri = ClassUri::parse(&query.uri)?;
    state.subscriptions.remove_class(&uri).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Class routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/classes", get(get_class).delete(delete_class))
}
