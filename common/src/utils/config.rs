use super::error::{ApiError, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub api_url: String,
    pub api_port: u16,
    pub request_timeout_seconds: u64,
    pub leaderboard_stale_seconds: u64,
    pub ratelimit_ip_forward_secret: String,
    pub max_sessions: usize,
    pub session_idle_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup instead of the process environment.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_url: Self::get_required(&lookup, "API_URL")?,
            api_port: Self::parse_value(&lookup, "PORT", "8080")?,
            request_timeout_seconds: Self::parse_value(&lookup, "REQUEST_TIMEOUT_SECONDS", "30")?,
            leaderboard_stale_seconds: Self::parse_value(&lookup, "LEADERBOARD_STALE_SECONDS", "120")?,
            ratelimit_ip_forward_secret: lookup("RATELIMIT_IP_FORWARD_SECRET").unwrap_or_default(),
            max_sessions: Self::parse_value(&lookup, "MAX_SESSIONS", "1000")?,
            session_idle_seconds: Self::parse_value(&lookup, "SESSION_IDLE_SECONDS", "3600")?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn leaderboard_stale_after(&self) -> Duration {
        Duration::from_secs(self.leaderboard_stale_seconds)
    }

    pub fn session_idle_after(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }

    fn get_required<F>(lookup: &F, key: &str) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{} not set", key)))
    }

    fn parse_value<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr,
        T::Err: std::fmt::Debug,
    {
        lookup(key)
            .as_deref()
            .unwrap_or(default)
            .parse()
            .map_err(|_| ApiError::Config(format!("Invalid {}", key)))
    }
}
