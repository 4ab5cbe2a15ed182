//! Subscription DTOs for subscribe, unsubscribe, and list operations.

use serde::{Deserialize, Serialize};

use super::class_dto::ClassDto;
use super::common_dto::PaginationMeta;
use crate::domain::UserId;

/// Request body for `POST /users/{user_id}/subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    /// Class page URI to watch.
    pub uri: String,
}

/// Response body for subscribe and unsubscribe.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    /// The user the operation was performed for.
    pub user_id: UserId,
    /// Whether the user is subscribed after the operation.
    pub subscribed: bool,
    /// The class after the operation.
    pub class: ClassDto,
}

/// Paginated list response for `GET /users/{user_id}/subscriptions`.
#[derive(Debug, Serialize)]
pub struct SubscriptionListResponse {
    /// The user whose subscriptions are listed.
    pub user_id: UserId,
    /// Classes on this page, sorted by URI.
    pub data: Vec<ClassDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
