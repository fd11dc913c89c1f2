use thiserror::Error;

use crate::utils::error::ApiError;

/// How a failed membership request (join or create) is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Conflict,
    NotFound,
    RateLimited,
    Other,
}

/// Status table for join and create responses.
///
/// The backend answers some conflicts with 403 instead of 409, so both map
/// to [`MembershipStatus::Conflict`].
pub fn classify_status(status: u16) -> MembershipStatus {
    match status {
        409 | 403 => MembershipStatus::Conflict,
        404 => MembershipStatus::NotFound,
        429 => MembershipStatus::RateLimited,
        _ => MembershipStatus::Other,
    }
}

pub fn classify(err: &ApiError) -> MembershipStatus {
    err.status().map_or(MembershipStatus::Other, classify_status)
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinLeaderboardError {
    #[error("Already a member of this leaderboard")]
    AlreadyMember,
    #[error("No leaderboard found for this invite code")]
    NotFound,
    #[error("Failed to join leaderboard")]
    UnknownError,
}

impl JoinLeaderboardError {
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::NotFound => "NOT_FOUND",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl From<&ApiError> for JoinLeaderboardError {
    fn from(err: &ApiError) -> Self {
        match classify(err) {
            MembershipStatus::Conflict => Self::AlreadyMember,
            MembershipStatus::NotFound => Self::NotFound,
            MembershipStatus::RateLimited | MembershipStatus::Other => Self::UnknownError,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateLeaderboardError {
    #[error("A leaderboard with this name already exists")]
    AlreadyExists,
    #[error("Failed to create leaderboard")]
    UnknownError,
}

impl CreateLeaderboardError {
    pub fn code(self) -> &'static str {
        match self {
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl From<&ApiError> for CreateLeaderboardError {
    fn from(err: &ApiError) -> Self {
        match classify(err) {
            MembershipStatus::Conflict => Self::AlreadyExists,
            MembershipStatus::NotFound
            | MembershipStatus::RateLimited
            | MembershipStatus::Other => Self::UnknownError,
        }
    }
}
