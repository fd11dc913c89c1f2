pub mod top_projects;

pub use top_projects::{ProjectActivity, ProjectDuration, ProjectTotal, all_time_top_projects};
