use serde::Serialize;
use utoipa::ToSchema;

use common::{statistics::ProjectTotal, utils::format::pretty_duration};

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProject {
    /// Absent for activity without a project name.
    pub project_name: Option<String>,
    pub duration: u64,
    pub duration_label: String,
}

impl From<ProjectTotal> for TopProject {
    fn from(total: ProjectTotal) -> Self {
        Self {
            duration_label: pretty_duration(total.duration),
            project_name: total.project_name,
            duration: total.duration,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopProjectsResponse {
    pub username: String,
    pub total_duration: u64,
    pub projects: Vec<TopProject>,
}
