use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::modal::{Leaderboard, LeaderboardData, LeaderboardMember};

/// Summary and detail of one leaderboard merged by name.
///
/// `member_count` is always taken from the loaded member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedLeaderboard {
    pub name: String,
    pub invite: String,
    pub creation_time: DateTime<Utc>,
    pub member_count: usize,
    pub members: Vec<LeaderboardMember>,
}

impl CombinedLeaderboard {
    pub fn new(data: &LeaderboardData) -> Self {
        Self {
            name: data.name.clone(),
            invite: data.invite.clone(),
            creation_time: data.creation_time,
            member_count: data.members.len(),
            members: data.members.clone(),
        }
    }

    /// Members ordered by `time_coded`, highest first. Equal times keep list order.
    pub fn ranked_members(&self) -> Vec<&LeaderboardMember> {
        rank_members(&self.members)
    }

    pub fn top_member(&self) -> Option<&LeaderboardMember> {
        self.ranked_members().into_iter().next()
    }

    /// 1-based rank of `username`, if they are a member.
    pub fn position_of(&self, username: &str) -> Option<usize> {
        self.ranked_members()
            .iter()
            .position(|member| member.username == username)
            .map(|index| index + 1)
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.members
            .iter()
            .any(|member| member.username == username && member.admin)
    }
}

pub fn rank_members(members: &[LeaderboardMember]) -> Vec<&LeaderboardMember> {
    let mut ranked: Vec<&LeaderboardMember> = members.iter().collect();
    ranked.sort_by(|a, b| b.time_coded.cmp(&a.time_coded));
    ranked
}

/// Merges summaries with whatever details `detail` can provide. Summaries
/// without a loaded detail are skipped.
pub fn combine<'a, F>(summaries: &[Leaderboard], detail: F) -> Vec<CombinedLeaderboard>
where
    F: Fn(&str) -> Option<&'a LeaderboardData>,
{
    summaries
        .iter()
        .filter_map(|summary| detail(&summary.name))
        .map(CombinedLeaderboard::new)
        .collect()
}
