use crate::leaderboards::LeaderboardApi;
use crate::utils::config::Config;
use crate::utils::error::{ApiError, Result};
use crate::utils::modal::{
    ActivityEntry, CreateRequest, CurrentUser, InviteCode, JoinRequest, Leaderboard,
    LeaderboardData, MemberRequest,
};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

const RATE_LIMIT_MESSAGE: &str = "Too many requests";

/// Client for the coding-time tracking API.
///
/// Cloning is cheap; [`TrackerApi::with_token`] yields a copy that
/// authenticates as one user.
#[derive(Clone)]
pub struct TrackerApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
    bypass_token: String,
}

impl TrackerApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("Invalid API_URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("API_URL {base_url} cannot be a base URL")));
        }

        let client = ClientBuilder::new()
            .user_agent("timeboard/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ExternalApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
            bypass_token: String::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut api = Self::new(&config.api_url, config.request_timeout())?;
        api.bypass_token = config.ratelimit_ip_forward_secret.clone();
        Ok(api)
    }

    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self.clone()
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Config(format!("API_URL {} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::ExternalApi(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            return Err(ApiError::RateLimit {
                retry_after,
                message: RATE_LIMIT_MESSAGE.to_string(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }

    async fn fetch_json<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        let response_text = response
            .text()
            .await
            .map_err(|e| ApiError::ExternalApi(format!("Failed to read response body: {}", e)))?;
        serde_json::from_str(&response_text)
            .map_err(|e| ApiError::ExternalApi(format!("Failed to parse API response: {}", e)))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await.map(drop)
    }

    pub async fn current_user(&self) -> Result<CurrentUser> {
        let url = self.endpoint(&["users", "@me"])?;
        self.fetch_json(self.client.get(url)).await
    }

    pub async fn activity_data(&self, username: &str) -> Result<Vec<ActivityEntry>> {
        let url = self.endpoint(&["users", username, "activity", "data"])?;
        self.fetch_json(self.client.get(url)).await
    }

    /// Raw current-activity payload of `username`, or `None` when nothing is running.
    pub async fn current_activity(
        &self,
        username: &str,
        client_ip: &str,
    ) -> Result<Option<serde_json::Value>> {
        let url = self.endpoint(&["users", username, "activity", "current"])?;
        let request = self
            .client
            .get(url)
            .header("client-ip", client_ip)
            .header("bypass-token", &self.bypass_token);

        let body = self
            .send(request)
            .await?
            .text()
            .await
            .map_err(|e| ApiError::ExternalApi(format!("Failed to read response body: {}", e)))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok((!value.is_null()).then_some(value))
    }
}

#[async_trait]
impl LeaderboardApi for TrackerApi {
    async fn list_leaderboards(&self) -> Result<Vec<Leaderboard>> {
        let url = self.endpoint(&["users", "@me", "leaderboards"])?;
        self.fetch_json(self.client.get(url)).await
    }

    async fn leaderboard(&self, name: &str) -> Result<LeaderboardData> {
        let url = self.endpoint(&["leaderboards", name])?;
        self.fetch_json(self.client.get(url)).await
    }

    async fn join_leaderboard(&self, invite: &str) -> Result<Leaderboard> {
        let url = self.endpoint(&["leaderboards", "join"])?;
        self.fetch_json(self.client.post(url).json(&JoinRequest { invite }))
            .await
    }

    async fn leave_leaderboard(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["leaderboards", name, "leave"])?;
        self.send_empty(self.client.post(url).json(&json!({}))).await
    }

    async fn create_leaderboard(&self, name: &str) -> Result<InviteCode> {
        let url = self.endpoint(&["leaderboards", "create"])?;
        self.fetch_json(self.client.post(url).json(&CreateRequest { name }))
            .await
    }

    async fn delete_leaderboard(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["leaderboards", name])?;
        self.send_empty(self.client.delete(url)).await
    }

    async fn set_admin_status(&self, name: &str, username: &str, admin: bool) -> Result<()> {
        let action = if admin { "promote" } else { "demote" };
        let url = self.endpoint(&["leaderboards", name, action])?;
        self.send_empty(self.client.post(url).json(&MemberRequest { user: username }))
            .await
    }

    async fn kick_member(&self, name: &str, username: &str) -> Result<()> {
        let url = self.endpoint(&["leaderboards", name, "kick"])?;
        self.send_empty(self.client.post(url).json(&MemberRequest { user: username }))
            .await
    }

    async fn regenerate_invite(&self, name: &str) -> Result<InviteCode> {
        let url = self.endpoint(&["leaderboards", name, "regenerate"])?;
        self.fetch_json(self.client.post(url).json(&json!({}))).await
    }
}
