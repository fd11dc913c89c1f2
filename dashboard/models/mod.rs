pub mod leaderboard;
pub mod project;
