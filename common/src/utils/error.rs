use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::leaderboards::errors::{CreateLeaderboardError, JoinLeaderboardError};

pub const RATE_LIMITED_PATH: &str = "/rate-limited";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Input validation failed: {field}")]
    Validation { field: String, message: String },

    #[error("External API request failed: {0}")]
    ExternalApi(String),

    #[error("External API returned status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found: {resource}")]
    NotFound { resource: String, id: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { retry_after: u64, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ApiError {
    const VALIDATION_ERROR: &'static str = "VALIDATION_ERROR";
    const EXTERNAL_API_ERROR: &'static str = "EXTERNAL_API_ERROR";
    const CONFIG_ERROR: &'static str = "CONFIG_ERROR";
    const NOT_FOUND: &'static str = "NOT_FOUND";
    const UNAUTHORIZED: &'static str = "UNAUTHORIZED";

    /// Upstream status code, when the failure came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimit { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimit { .. })
    }
}

fn error_response(status: StatusCode, message: String, code: &str) -> Response {
    let body = json!({
        "error": message,
        "error_code": code,
        "status": status.as_u16()
    });

    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            Self::Validation { message, .. } => (
                StatusCode::BAD_REQUEST,
                message.clone(),
                Self::VALIDATION_ERROR,
            ),
            Self::ExternalApi(msg) => {
                tracing::error!("External API error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "Upstream request failed".into(),
                    Self::EXTERNAL_API_ERROR,
                )
            }
            Self::Http { status, message } => {
                let status = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, message.clone(), Self::EXTERNAL_API_ERROR)
            }
            Self::Config(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".into(),
                    Self::CONFIG_ERROR,
                )
            }
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                format!("{resource} {id} not found"),
                Self::NOT_FOUND,
            ),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), Self::UNAUTHORIZED),
            Self::RateLimit {
                retry_after,
                message,
            } => {
                tracing::warn!(retry_after, "Rate limited upstream: {message}");
                let mut response = Redirect::to(RATE_LIMITED_PATH).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
                return response;
            }
        };

        error_response(status, message, code)
    }
}

impl IntoResponse for JoinLeaderboardError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::AlreadyMember => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UnknownError => StatusCode::BAD_GATEWAY,
        };
        error_response(status, self.to_string(), self.code())
    }
}

impl IntoResponse for CreateLeaderboardError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::UnknownError => StatusCode::BAD_GATEWAY,
        };
        error_response(status, self.to_string(), self.code())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::ExternalApi(format!("Failed to parse API response: {err}"))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::ExternalApi(format!("IO error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
