pub mod error;
pub mod modal;
pub mod config;
pub mod format;
pub mod timestamp;

pub use config::Config;
pub use error::{Result, ApiError};
pub use modal::{Leaderboard, LeaderboardData, LeaderboardMember};
