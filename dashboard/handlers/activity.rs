use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    middleware::{client_ip, session_token},
};

const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[utoipa::path(
    get,
    path = "/api/activity-status/{username}",
    params(("username" = String, Path, description = "Whose current activity to fetch")),
    responses(
        (status = 200, description = "Current activity, or null when idle"),
        (status = 303, description = "Upstream rate limit, redirects to /rate-limited"),
        (status = 500, description = "Upstream failure")
    ),
    tag = "activity"
)]
pub async fn get_activity_status(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    let api = match session_token(&headers) {
        Some(token) => state.api.with_token(token),
        None => state.api.clone(),
    };
    let ip = client_ip(&headers);

    match api.current_activity(&username, &ip).await {
        Ok(activity) => Json(activity).into_response(),
        Err(e) if e.is_rate_limited() => e.into_response(),
        Err(e) => {
            tracing::error!(username = %username, "Failed to fetch current activity: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": UNKNOWN_ERROR })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/rate-limited",
    responses((status = 429, description = "The upstream API is rate limiting this client")),
    tag = "activity"
)]
pub async fn rate_limited() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": "Too many requests",
            "error_code": "RATE_LIMITED",
            "message": "The time tracking API is rate limiting requests. Try again in a moment."
        })),
    )
        .into_response()
}
