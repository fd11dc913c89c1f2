use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderMap, Request, header, request::Parts},
    middleware::Next,
    response::Response,
};

use common::ApiError;

use crate::{AppState, session::Session};

const TOKEN_COOKIE: &str = "token";
const UNKNOWN_IP: &str = "Unknown IP";

pub async fn request_logger(
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        path = %path,
        "Request started"
    );

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    tracing::info!(
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Bearer token from the `Authorization` header, falling back to the `token` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Address of the browser that made the request, as reported by the proxy in front of us.
pub fn client_ip(headers: &HeaderMap) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header_value("client-ip")
        .or_else(|| {
            header_value("x-forwarded-for")
                .and_then(|forwarded| forwarded.split(',').next())
                .map(str::trim)
        })
        .or_else(|| header_value("x-real-ip"))
        .unwrap_or(UNKNOWN_IP)
        .to_string()
}

/// The caller's session, created on first use of a token.
pub struct CurrentSession(pub Arc<Session>);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

        Ok(Self(state.sessions.session(&token)))
    }
}
