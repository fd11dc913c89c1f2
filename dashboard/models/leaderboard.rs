use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::{
    CombinedLeaderboard,
    utils::{
        error::{ApiError, Result},
        format::{ordinal, pretty_duration},
        modal::{Leaderboard, LeaderboardData, LeaderboardMember},
    },
    leaderboards::view::rank_members,
};

const NAME_MIN_LENGTH: usize = 2;
const NAME_MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberEntry {
    pub rank: usize,
    pub username: String,
    pub admin: bool,
    pub time_coded: u64,
    pub time_coded_label: String,
}

impl MemberEntry {
    fn new(rank: usize, member: &LeaderboardMember) -> Self {
        Self {
            rank,
            username: member.username.clone(),
            admin: member.admin,
            time_coded: member.time_coded,
            time_coded_label: pretty_duration(member.time_coded),
        }
    }
}

fn ranked_entries(members: &[LeaderboardMember]) -> Vec<MemberEntry> {
    rank_members(members)
        .into_iter()
        .enumerate()
        .map(|(index, member)| MemberEntry::new(index + 1, member))
        .collect()
}

/// One row of the leaderboards page, seen from the current user.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardOverview {
    pub name: String,
    pub invite: String,
    pub creation_time: DateTime<Utc>,
    pub member_count: usize,
    pub top_member: Option<MemberEntry>,
    pub your_position: Option<usize>,
    pub your_position_label: Option<String>,
    pub admin: bool,
}

impl LeaderboardOverview {
    pub fn new(leaderboard: &CombinedLeaderboard, username: &str) -> Self {
        let your_position = leaderboard.position_of(username);

        Self {
            name: leaderboard.name.clone(),
            invite: leaderboard.invite.clone(),
            creation_time: leaderboard.creation_time,
            member_count: leaderboard.member_count,
            top_member: leaderboard.top_member().map(|member| MemberEntry::new(1, member)),
            your_position,
            your_position_label: your_position.map(ordinal),
            admin: leaderboard.is_admin(username),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardDetail {
    pub name: String,
    pub invite: String,
    pub creation_time: DateTime<Utc>,
    pub member_count: usize,
    pub members: Vec<MemberEntry>,
}

impl From<LeaderboardData> for LeaderboardDetail {
    fn from(data: LeaderboardData) -> Self {
        Self {
            members: ranked_entries(&data.members),
            member_count: data.members.len(),
            name: data.name,
            invite: data.invite,
            creation_time: data.creation_time,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedLeaderboard {
    pub name: String,
    pub member_count: usize,
}

impl From<Leaderboard> for JoinedLeaderboard {
    fn from(leaderboard: Leaderboard) -> Self {
        Self {
            name: leaderboard.name,
            member_count: leaderboard.member_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCodeResponse {
    pub invite_code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinLeaderboardRequest {
    pub invite: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaderboardRequest {
    pub name: String,
}

impl CreateLeaderboardRequest {
    /// Names are 2 to 32 ASCII letters or digits.
    pub fn validate(&self) -> Result<()> {
        let name = self.name.as_str();
        let message = if name.is_empty() {
            Some("Leaderboard name is required".to_string())
        } else if name.len() < NAME_MIN_LENGTH {
            Some(format!("Leaderboard name must be at least {NAME_MIN_LENGTH} characters"))
        } else if name.len() > NAME_MAX_LENGTH {
            Some(format!("Leaderboard name must be at most {NAME_MAX_LENGTH} characters"))
        } else if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            Some("Leaderboard name may only contain letters and numbers".to_string())
        } else {
            None
        };

        match message {
            Some(message) => Err(ApiError::Validation {
                field: "name".to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MemberActionRequest {
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn member(username: &str, admin: bool, time_coded: u64) -> LeaderboardMember {
        LeaderboardMember {
            username: username.to_string(),
            admin,
            time_coded,
        }
    }

    fn board() -> LeaderboardData {
        LeaderboardData {
            name: "rustaceans".to_string(),
            invite: "ttlic_abc".to_string(),
            creation_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            members: vec![
                member("alice", true, 600),
                member("bob", false, 7500),
                member("carol", false, 60),
            ],
        }
    }

    #[test]
    fn overview_from_the_callers_point_of_view() {
        let combined = CombinedLeaderboard::new(&board());
        let overview = LeaderboardOverview::new(&combined, "alice");

        assert_eq!(overview.member_count, 3);
        assert_eq!(overview.top_member.as_ref().map(|m| m.username.as_str()), Some("bob"));
        assert_eq!(overview.top_member.as_ref().map(|m| m.time_coded_label.as_str()), Some("2h 5m"));
        assert_eq!(overview.your_position, Some(2));
        assert_eq!(overview.your_position_label.as_deref(), Some("2nd"));
        assert!(overview.admin);

        let outsider = LeaderboardOverview::new(&combined, "mallory");
        assert_eq!(outsider.your_position, None);
        assert!(!outsider.admin);
    }

    #[test]
    fn detail_lists_members_by_rank() {
        let detail = LeaderboardDetail::from(board());
        let ranks: Vec<(usize, &str)> = detail
            .members
            .iter()
            .map(|m| (m.rank, m.username.as_str()))
            .collect();
        assert_eq!(ranks, [(1, "bob"), (2, "alice"), (3, "carol")]);
    }

    #[test]
    fn leaderboard_name_rules() {
        let check = |name: &str| CreateLeaderboardRequest { name: name.to_string() }.validate();

        assert!(check("team1").is_ok());
        assert!(check("ab").is_ok());
        assert!(check("").is_err());
        assert!(check("a").is_err());
        assert!(check("x".repeat(33).as_str()).is_err());
        assert!(check("team one").is_err());
        assert!(check("tiimi-ä").is_err());
    }
}
