use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::utils::error::Result;
use crate::utils::modal::{InviteCode, Leaderboard, LeaderboardData};

use super::errors::{CreateLeaderboardError, JoinLeaderboardError};
use super::reducers::Mutation;
use super::state::{LEADERBOARDS_KEY, LeaderboardCache};
use super::view::CombinedLeaderboard;

/// Remote operations the sync layer depends on. Each method is exactly one request.
#[async_trait]
pub trait LeaderboardApi: Send + Sync {
    async fn list_leaderboards(&self) -> Result<Vec<Leaderboard>>;
    async fn leaderboard(&self, name: &str) -> Result<LeaderboardData>;
    async fn join_leaderboard(&self, invite: &str) -> Result<Leaderboard>;
    async fn leave_leaderboard(&self, name: &str) -> Result<()>;
    async fn create_leaderboard(&self, name: &str) -> Result<InviteCode>;
    async fn delete_leaderboard(&self, name: &str) -> Result<()>;
    async fn set_admin_status(&self, name: &str, username: &str, admin: bool) -> Result<()>;
    async fn kick_member(&self, name: &str, username: &str) -> Result<()>;
    async fn regenerate_invite(&self, name: &str) -> Result<InviteCode>;
}

/// Read-through cache of the current user's leaderboards plus the
/// mutations that keep it coherent.
///
/// The lock is only taken between network calls, never across an `.await`.
pub struct LeaderboardSync<A> {
    api: A,
    cache: Mutex<LeaderboardCache>,
}

impl<A> LeaderboardSync<A>
where
    A: LeaderboardApi,
{
    pub fn new(api: A, stale_after: Duration) -> Self {
        Self {
            api,
            cache: Mutex::new(LeaderboardCache::new(stale_after)),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Summaries, served from cache inside the staleness window.
    #[instrument(skip(self))]
    pub async fn leaderboards(&self) -> Result<Vec<Leaderboard>> {
        let ticket = {
            let mut cache = self.cache.lock();
            if let Some(cached) = cache.fresh_leaderboards(Instant::now()) {
                debug!("Leaderboard list served from cache");
                return Ok(cached.clone());
            }
            cache.summaries.begin_fetch(LEADERBOARDS_KEY)
        };

        let fetched = self.api.list_leaderboards().await?;

        if !self
            .cache
            .lock()
            .summaries
            .complete_fetch(ticket, fetched.clone(), Instant::now())
        {
            warn!("Discarding superseded leaderboard list response");
        }
        Ok(fetched)
    }

    /// Detail of one leaderboard, served from cache inside the staleness window.
    #[instrument(skip(self))]
    pub async fn leaderboard(&self, name: &str) -> Result<LeaderboardData> {
        let ticket = {
            let mut cache = self.cache.lock();
            if let Some(cached) = cache.fresh_detail(name, Instant::now()) {
                debug!("Leaderboard detail served from cache");
                return Ok(cached.clone());
            }
            cache.details.begin_fetch(name.to_string())
        };

        let fetched = self.api.leaderboard(name).await?;

        if !self
            .cache
            .lock()
            .details
            .complete_fetch(ticket, fetched.clone(), Instant::now())
        {
            warn!(leaderboard = name, "Discarding superseded leaderboard detail response");
        }
        Ok(fetched)
    }

    /// Loads the list and every detail concurrently, then returns the merged view.
    ///
    /// A failed detail load is logged and left out; a failed list load is
    /// returned. Rate limiting on any detail aborts the whole load.
    pub async fn load_all(&self) -> Result<Vec<CombinedLeaderboard>> {
        let summaries = self.leaderboards().await?;

        let mut futures: FuturesUnordered<_> = summaries
            .iter()
            .map(move |summary| async move {
                (summary.name.as_str(), self.leaderboard(&summary.name).await)
            })
            .collect();

        while let Some((name, result)) = futures.next().await {
            match result {
                Ok(_) => {}
                Err(e) if e.is_rate_limited() => {
                    warn!(leaderboard = name, "Rate limited while loading leaderboard details");
                    return Err(e);
                }
                Err(e) => warn!(leaderboard = name, "Failed to load leaderboard detail: {}", e),
            }
        }

        Ok(self.combined())
    }

    pub fn combined(&self) -> Vec<CombinedLeaderboard> {
        self.cache.lock().combined()
    }

    pub fn cached_leaderboards(&self) -> Option<Vec<Leaderboard>> {
        self.cache.lock().leaderboards().cloned()
    }

    pub fn cached_leaderboard(&self, name: &str) -> Option<LeaderboardData> {
        self.cache.lock().detail(name).cloned()
    }

    fn apply(&self, mutation: Mutation) {
        self.cache.lock().apply(&mutation, Instant::now());
    }

    #[instrument(skip(self, invite))]
    pub async fn join(&self, invite: &str) -> std::result::Result<Leaderboard, JoinLeaderboardError> {
        match self.api.join_leaderboard(invite).await {
            Ok(joined) => {
                info!(leaderboard = %joined.name, "Joined leaderboard");
                self.apply(Mutation::Joined(joined.clone()));
                Ok(joined)
            }
            Err(e) => {
                warn!("Join failed: {}", e);
                Err(JoinLeaderboardError::from(&e))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn leave(&self, name: &str) -> Result<()> {
        self.api.leave_leaderboard(name).await?;
        info!("Left leaderboard");
        self.apply(Mutation::Left(name.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> std::result::Result<InviteCode, CreateLeaderboardError> {
        match self.api.create_leaderboard(name).await {
            Ok(invite) => {
                info!("Created leaderboard");
                self.apply(Mutation::Created(name.to_string()));
                Ok(invite)
            }
            Err(e) => {
                warn!("Create failed: {}", e);
                Err(CreateLeaderboardError::from(&e))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        self.api.delete_leaderboard(name).await?;
        info!("Deleted leaderboard");
        self.apply(Mutation::Deleted(name.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_user_admin_status(&self, name: &str, username: &str, admin: bool) -> Result<()> {
        self.api.set_admin_status(name, username, admin).await?;
        self.apply(Mutation::AdminStatusChanged {
            leaderboard: name.to_string(),
            username: username.to_string(),
            admin,
        });
        Ok(())
    }

    pub async fn promote(&self, name: &str, username: &str) -> Result<()> {
        self.set_user_admin_status(name, username, true).await
    }

    pub async fn demote(&self, name: &str, username: &str) -> Result<()> {
        self.set_user_admin_status(name, username, false).await
    }

    #[instrument(skip(self))]
    pub async fn kick(&self, name: &str, username: &str) -> Result<()> {
        self.api.kick_member(name, username).await?;
        self.apply(Mutation::Kicked {
            leaderboard: name.to_string(),
            username: username.to_string(),
        });
        Ok(())
    }

    /// Issues a new invite code and returns it.
    #[instrument(skip(self))]
    pub async fn regenerate_invite_code(&self, name: &str) -> Result<String> {
        let InviteCode { invite_code } = self.api.regenerate_invite(name).await?;
        self.apply(Mutation::InviteRegenerated {
            leaderboard: name.to_string(),
            invite: invite_code.clone(),
        });
        Ok(invite_code)
    }

    /// Drops cache entries that have been stale for longer than `grace`.
    pub fn prune(&self, grace: Duration) -> usize {
        let mut cache = self.cache.lock();
        let now = Instant::now();
        cache.summaries.prune(now, grace) + cache.details.prune(now, grace)
    }
}
