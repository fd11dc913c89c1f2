use std::time::{Duration, Instant};

use crate::cache::KeyedCache;
use crate::utils::modal::{Leaderboard, LeaderboardData};

use super::view::{CombinedLeaderboard, combine};

pub const LEADERBOARDS_KEY: &str = "leaderboards";

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(2 * 60);

/// Local mirror of the leaderboards the current user belongs to.
#[derive(Debug)]
pub struct LeaderboardCache {
    pub summaries: KeyedCache<&'static str, Vec<Leaderboard>>,
    pub details: KeyedCache<String, LeaderboardData>,
}

impl Default for LeaderboardCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER)
    }
}

impl LeaderboardCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            summaries: KeyedCache::new(stale_after),
            details: KeyedCache::new(stale_after),
        }
    }

    pub fn leaderboards(&self) -> Option<&Vec<Leaderboard>> {
        self.summaries.peek(&LEADERBOARDS_KEY)
    }

    pub fn fresh_leaderboards(&self, now: Instant) -> Option<&Vec<Leaderboard>> {
        self.summaries.fresh(&LEADERBOARDS_KEY, now)
    }

    pub fn detail(&self, name: &str) -> Option<&LeaderboardData> {
        self.details.peek(&name.to_string())
    }

    pub fn fresh_detail(&self, name: &str, now: Instant) -> Option<&LeaderboardData> {
        self.details.fresh(&name.to_string(), now)
    }

    /// Summaries merged with every detail that has been loaded, in summary order.
    pub fn combined(&self) -> Vec<CombinedLeaderboard> {
        let summaries = self.leaderboards().map(Vec::as_slice).unwrap_or_default();
        combine(summaries, |name| self.detail(name))
    }
}
