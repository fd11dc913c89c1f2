use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Leaderboard summary as listed under `/users/@me/leaderboards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub name: String,
    pub member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardMember {
    pub username: String,
    pub admin: bool,
    pub time_coded: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardData {
    pub name: String,
    pub invite: String,
    #[serde(with = "super::timestamp")]
    pub creation_time: DateTime<Utc>,
    pub members: Vec<LeaderboardMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCode {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinRequest<'a> {
    pub invite: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MemberRequest<'a> {
    pub user: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: Option<i64>,
    pub username: String,
    pub friend_code: Option<String>,
    #[serde(default, with = "optional_timestamp")]
    pub registration_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityEntry {
    pub id: Option<i64>,
    #[serde(with = "super::timestamp")]
    pub start_time: DateTime<Utc>,
    pub duration: u64,
    pub project_name: Option<String>,
    pub language: Option<String>,
    pub editor_name: Option<String>,
    pub hostname: Option<String>,
}

mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| crate::utils::timestamp::parse_timestamp(&raw))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaderboard_data_accepts_naive_creation_time() {
        let data: LeaderboardData = serde_json::from_str(
            r#"{
                "name": "team1",
                "invite": "ttlic_abc",
                "creation_time": "2022-06-01T08:00:00.123456",
                "members": [{"username": "alice", "admin": true, "time_coded": 3600}]
            }"#,
        )
        .unwrap();

        assert_eq!(data.members.len(), 1);
        assert_eq!(data.creation_time.to_rfc3339(), "2022-06-01T08:00:00.123456+00:00");
    }

    #[test]
    fn activity_entry_tolerates_missing_project() {
        let entry: ActivityEntry = serde_json::from_str(
            r#"{"id": 1, "start_time": "2023-01-01T10:00:00Z", "duration": 60,
                "project_name": null, "language": "rust", "editor_name": "vim", "hostname": "box"}"#,
        )
        .unwrap();

        assert!(entry.project_name.is_none());
        assert_eq!(entry.duration, 60);
    }

    #[test]
    fn current_user_without_registration_time() {
        let user: CurrentUser = serde_json::from_str(r#"{"id": 4, "username": "alice"}"#).unwrap();
        assert_eq!(user.username, "alice");
        assert!(user.registration_time.is_none());
    }
}
