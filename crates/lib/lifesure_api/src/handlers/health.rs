//! Liveness endpoint.

use axum::Json;

use crate::models::MessageResponse;

/// `GET /`: reports that the API is up.
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::ok("LifeSure API is running"))
}
