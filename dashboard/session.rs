use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use common::{
    Config, LeaderboardSync, TrackerApi,
    utils::{error::Result, modal::CurrentUser},
};

/// Everything cached on behalf of one bearer token.
pub struct Session {
    api: TrackerApi,
    pub leaderboards: LeaderboardSync<TrackerApi>,
    user: OnceCell<CurrentUser>,
    last_used: Mutex<Instant>,
}

impl Session {
    fn new(api: TrackerApi, stale_after: Duration) -> Self {
        Self {
            leaderboards: LeaderboardSync::new(api.clone(), stale_after),
            api,
            user: OnceCell::new(),
            last_used: Mutex::new(Instant::now()),
        }
    }

    pub fn api(&self) -> &TrackerApi {
        &self.api
    }

    /// Fetched once per session; a failed lookup is retried on the next call.
    pub async fn current_user(&self) -> Result<&CurrentUser> {
        self.user
            .get_or_try_init(|| self.api.current_user())
            .await
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_used.lock())
    }
}

/// Token to session map capped at `max_sessions`. A full store drops idle
/// sessions first, then the least recently used one.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    api: TrackerApi,
    stale_after: Duration,
    idle_after: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(api: TrackerApi, config: &Config) -> Self {
        Self {
            sessions: DashMap::new(),
            api,
            stale_after: config.leaderboard_stale_after(),
            idle_after: config.session_idle_after(),
            max_sessions: config.max_sessions,
        }
    }

    pub fn idle_after(&self) -> Duration {
        self.idle_after
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn session(&self, token: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.get(token) {
            session.touch();
            return Arc::clone(session.value());
        }

        if self.sessions.len() >= self.max_sessions {
            let removed = self.prune_idle();
            tracing::debug!(removed, "Session store full, pruned idle sessions");
        }
        while self.sessions.len() >= self.max_sessions.max(1) {
            if !self.evict_least_recent() {
                break;
            }
        }

        let session = Arc::new(Session::new(self.api.with_token(token), self.stale_after));
        let entry = self.sessions.entry(token.to_string()).or_insert(session);
        Arc::clone(entry.value())
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value().last_used.lock()))
            .min_by_key(|(_, last_used)| *last_used);

        match oldest {
            Some((token, _)) => {
                tracing::debug!("Session store full, evicting least recently used session");
                self.sessions.remove(&token).is_some()
            }
            None => false,
        }
    }

    /// Drops sessions unused for longer than the idle window and trims
    /// stale cache entries of the rest.
    pub fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();

        self.sessions.retain(|_, session| {
            if session.idle_for(now) >= self.idle_after {
                return false;
            }
            session.leaderboards.prune(self.idle_after);
            true
        });

        before.saturating_sub(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max_sessions: &str, idle_seconds: &str) -> SessionStore {
        let config = Config::from_source(|key| match key {
            "API_URL" => Some("http://localhost:9".to_string()),
            "MAX_SESSIONS" => Some(max_sessions.to_string()),
            "SESSION_IDLE_SECONDS" => Some(idle_seconds.to_string()),
            _ => None,
        })
        .unwrap();
        let api = TrackerApi::from_config(&config).unwrap();
        SessionStore::new(api, &config)
    }

    #[tokio::test]
    async fn same_token_shares_a_session() {
        let store = store("10", "3600");

        let first = store.session("alpha");
        let again = store.session("alpha");
        let other = store.session("beta");

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn full_store_evicts_idle_sessions() {
        let store = store("1", "0");

        let first = store.session("alpha");
        store.session("beta");

        assert_eq!(store.len(), 1);
        assert!(!Arc::ptr_eq(&first, &store.session("alpha")));
    }

    #[tokio::test]
    async fn store_never_grows_past_capacity() {
        let store = store("3", "3600");

        for n in 0..20 {
            store.session(&format!("token-{n}"));
            assert!(store.len() <= 3);
        }
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted_first() {
        let store = store("2", "3600");

        let alpha = store.session("alpha");
        std::thread::sleep(Duration::from_millis(2));
        store.session("beta");
        std::thread::sleep(Duration::from_millis(2));
        store.session("alpha");
        std::thread::sleep(Duration::from_millis(2));
        store.session("gamma");

        assert_eq!(store.len(), 2);
        assert!(Arc::ptr_eq(&alpha, &store.session("alpha")));
    }

    #[tokio::test]
    async fn active_sessions_survive_pruning() {
        let store = store("10", "3600");
        store.session("alpha");

        assert_eq!(store.prune_idle(), 0);
        assert_eq!(store.len(), 1);
    }
}
