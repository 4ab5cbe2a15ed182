//! Subscription handlers: subscribe, unsubscribe, list.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    ClassDto, PaginationParams, SubscribeRequest, SubscriptionListResponse, SubscriptionResponse,
    UriQuery,
};
use crate::app_state::AppState;
use crate::domain::{ClassUri, UserId};

/// `POST /users/{user_id}/subscriptions`: Watch a class.
///
/// Creates the class on first use by fetching its page once.
///
/// # Errors
///
/// Returns 400 for a malformed user or URI, and the generic subscribe
/// failure message with 500 or 502 otherwise.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, Response> {
    let user_id = UserId::parse(&user_id).map_err(IntoResponse::into_response)?;
    let uri = ClassUri::parse(&req.uri).map_err(IntoResponse::into_response)?;

    let event = state
        .subscriptions
        .subscribe(&uri, &user_id)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse {
            user_id,
            subscribed: true,
            class: ClassDto::from(event),
        }),
    ))
}

/// `DELETE /users/{user_id}/subscriptions?uri=...`: Stop watching a class.
///
/// # Errors
///
/// Returns 404 if the class is unknown, and the generic unsubscribe
/// failure message with 500 otherwise.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<UriQuery>,
) -> Result<impl IntoResponse, Response> {
    let user_id = UserId::parse(&user_id).map_err(IntoResponse::into_response)?;
    let uri = ClassUri::parse(&query.uri).map_err(IntoResponse::into_response)?;

    let event = state
        .subscriptions
        .unsubscribe(&uri, &user_id)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(SubscriptionResponse {
        user_id,
        subscribed: false,
        class: ClassDto::from(event),
    }))
}

/// `GET /users/{user_id}/subscriptions`: List watched classes, paginated.
///
/// # Errors
///
/// Returns the generic list failure message with 500 on store failure.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, Response> {
    let user_id = UserId::parse(&user_id).map_err(IntoResponse::into_response)?;

    let events = state
        .subscriptions
        .list_subscriptions(&user_id)
        .await
        .map_err(IntoResponse::into_response)?;

    let classes: Vec<ClassDto> = events.iter().map(ClassDto::from).collect();
    let (data, pagination) = params.paginate(classes);

    Ok(Json(SubscriptionListResponse {
        user_id,
        data,
        pagination,
    }))
}

/// Per-user subscription routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/subscriptions",
        get(list_subscriptions).post(subscribe).delete(unsubscribe),
    )
}
