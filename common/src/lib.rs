pub mod utils;
pub mod cache;
pub mod services;
pub mod statistics;
pub mod leaderboards;

pub use utils::{Config, Result, ApiError};
pub use services::TrackerApi;
pub use leaderboards::{LeaderboardApi, LeaderboardSync, CombinedLeaderboard};
pub use statistics::all_time_top_projects;
