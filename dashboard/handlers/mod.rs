pub mod activity;
pub mod leaderboards;
pub mod projects;
