//! Cache rewrites applied after a successful mutation.
//!
//! Each reducer patches the cache so the change is visible before the next
//! background refetch. None of them perform I/O.

use std::time::Instant;

use tracing::debug;

use crate::utils::modal::Leaderboard;

use super::state::{LEADERBOARDS_KEY, LeaderboardCache};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Joined(Leaderboard),
    Left(String),
    Created(String),
    Deleted(String),
    AdminStatusChanged {
        leaderboard: String,
        username: String,
        admin: bool,
    },
    Kicked {
        leaderboard: String,
        username: String,
    },
    InviteRegenerated {
        leaderboard: String,
        invite: String,
    },
}

impl LeaderboardCache {
    pub fn apply(&mut self, mutation: &Mutation, now: Instant) {
        debug!(?mutation, "Applying leaderboard mutation to cache");

        match mutation {
            Mutation::Joined(joined) => {
                self.upsert_summary(joined.clone(), now);
                self.details.invalidate(&joined.name);
            }
            Mutation::Created(name) => {
                self.upsert_summary(
                    Leaderboard {
                        name: name.clone(),
                        member_count: 0,
                    },
                    now,
                );
            }
            Mutation::Left(name) | Mutation::Deleted(name) => {
                self.summaries.patch(&LEADERBOARDS_KEY, |summaries| {
                    summaries.retain(|summary| summary.name != *name);
                });
                self.details.remove(name);
            }
            Mutation::AdminStatusChanged {
                leaderboard,
                username,
                admin,
            } => {
                self.details.patch(leaderboard, |data| {
                    for member in data.members.iter_mut().filter(|m| m.username == *username) {
                        member.admin = *admin;
                    }
                });
            }
            Mutation::Kicked {
                leaderboard,
                username,
            } => {
                self.details.patch(leaderboard, |data| {
                    data.members.retain(|member| member.username != *username);
                });
            }
            Mutation::InviteRegenerated { leaderboard, invite } => {
                self.details.patch(leaderboard, |data| {
                    data.invite = invite.clone();
                });
            }
        }
    }

    /// Adds or replaces a summary. When no list has been fetched yet the
    /// entry is seeded stale so the next read still loads the full list.
    fn upsert_summary(&mut self, summary: Leaderboard, now: Instant) {
        let mut pending = Some(summary);
        self.summaries.patch(&LEADERBOARDS_KEY, |summaries| {
            if let Some(summary) = pending.take() {
                match summaries.iter_mut().find(|s| s.name == summary.name) {
                    Some(existing) => *existing = summary,
                    None => summaries.push(summary),
                }
            }
        });

        if let Some(summary) = pending {
            self.summaries.insert_stale(LEADERBOARDS_KEY, vec![summary], now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::modal::{LeaderboardData, LeaderboardMember};
    use chrono::{TimeZone, Utc};

    fn member(username: &str, admin: bool, time_coded: u64) -> LeaderboardMember {
        LeaderboardMember {
            username: username.to_string(),
            admin,
            time_coded,
        }
    }

    fn loaded_cache(now: Instant) -> LeaderboardCache {
        let mut cache = LeaderboardCache::default();

        let ticket = cache.summaries.begin_fetch(LEADERBOARDS_KEY);
        cache.summaries.complete_fetch(
            ticket,
            vec![Leaderboard {
                name: "rustaceans".to_string(),
                member_count: 3,
            }],
            now,
        );

        let ticket = cache.details.begin_fetch("rustaceans".to_string());
        cache.details.complete_fetch(
            ticket,
            LeaderboardData {
                name: "rustaceans".to_string(),
                invite: "ttlic_old".to_string(),
                creation_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                members: vec![
                    member("alice", false, 100),
                    member("bob", true, 300),
                    member("carol", false, 200),
                ],
            },
            now,
        );
        cache
    }

    #[test]
    fn create_appends_zero_member_summary() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(&Mutation::Created("team1".to_string()), now);

        let summaries = cache.fresh_leaderboards(now).expect("list stays fresh");
        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries.last(),
            Some(&Leaderboard {
                name: "team1".to_string(),
                member_count: 0
            })
        );
    }

    #[test]
    fn create_before_list_is_loaded_seeds_a_stale_list() {
        let now = Instant::now();
        let mut cache = LeaderboardCache::default();

        cache.apply(&Mutation::Created("team1".to_string()), now);

        assert_eq!(cache.leaderboards().map(Vec::len), Some(1));
        assert!(cache.fresh_leaderboards(now).is_none());
    }

    #[test]
    fn promote_only_touches_the_target_member() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);
        let before = cache.detail("rustaceans").cloned().unwrap();

        cache.apply(
            &Mutation::AdminStatusChanged {
                leaderboard: "rustaceans".to_string(),
                username: "alice".to_string(),
                admin: true,
            },
            now,
        );

        let after = cache.detail("rustaceans").unwrap();
        assert_eq!(after.members[0], member("alice", true, 100));
        assert_eq!(after.members[1..], before.members[1..]);
        assert_eq!(after.invite, before.invite);
    }

    #[test]
    fn demote_clears_admin_flag() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(
            &Mutation::AdminStatusChanged {
                leaderboard: "rustaceans".to_string(),
                username: "bob".to_string(),
                admin: false,
            },
            now,
        );

        assert!(cache.detail("rustaceans").unwrap().members.iter().all(|m| !m.admin));
    }

    #[test]
    fn admin_change_on_unloaded_detail_is_ignored() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(
            &Mutation::AdminStatusChanged {
                leaderboard: "unknown".to_string(),
                username: "alice".to_string(),
                admin: true,
            },
            now,
        );

        assert!(cache.detail("unknown").is_none());
    }

    #[test]
    fn kick_removes_member_and_member_count_follows() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(
            &Mutation::Kicked {
                leaderboard: "rustaceans".to_string(),
                username: "carol".to_string(),
            },
            now,
        );

        let combined = cache.combined();
        assert_eq!(combined[0].member_count, 2);
        assert!(combined[0].members.iter().all(|m| m.username != "carol"));
    }

    #[test]
    fn regenerate_replaces_invite() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(
            &Mutation::InviteRegenerated {
                leaderboard: "rustaceans".to_string(),
                invite: "ttlic_new".to_string(),
            },
            now,
        );

        assert_eq!(cache.detail("rustaceans").unwrap().invite, "ttlic_new");
    }

    #[test]
    fn join_appends_and_invalidates_detail() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);

        cache.apply(
            &Mutation::Joined(Leaderboard {
                name: "rustaceans".to_string(),
                member_count: 4,
            }),
            now,
        );
        cache.apply(
            &Mutation::Joined(Leaderboard {
                name: "gophers".to_string(),
                member_count: 9,
            }),
            now,
        );

        let summaries = cache.leaderboards().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].member_count, 4);
        assert_eq!(summaries[1].name, "gophers");
        assert!(cache.fresh_detail("rustaceans", now).is_none());
        assert!(cache.detail("rustaceans").is_some());
    }

    #[test]
    fn leave_and_delete_drop_summary_and_detail() {
        let now = Instant::now();
        let mut cache = loaded_cache(now);
        cache.apply(&Mutation::Created("team1".to_string()), now);

        cache.apply(&Mutation::Left("rustaceans".to_string()), now);
        assert!(cache.detail("rustaceans").is_none());
        assert_eq!(cache.leaderboards().unwrap().len(), 1);

        cache.apply(&Mutation::Deleted("team1".to_string()), now);
        assert!(cache.leaderboards().unwrap().is_empty());
        assert!(cache.combined().is_empty());
    }

    #[test]
    fn leave_during_first_list_fetch_discards_the_response() {
        let mut cache = LeaderboardCache::default();
        let now = Instant::now();

        let ticket = cache.summaries.begin_fetch(LEADERBOARDS_KEY);
        cache.apply(&Mutation::Left("rustaceans".to_string()), now);

        let stored = cache.summaries.complete_fetch(
            ticket,
            vec![Leaderboard {
                name: "rustaceans".to_string(),
                member_count: 3,
            }],
            now,
        );
        assert!(!stored);
        assert!(cache.leaderboards().is_none());
    }
}
