use axum::{Json, extract::Path};

use common::{all_time_top_projects, utils::error::Result};

use crate::{
    middleware::CurrentSession,
    models::project::{TopProject, TopProjectsResponse},
};

#[utoipa::path(
    get,
    path = "/v1/users/{username}/top-projects",
    params(("username" = String, Path, description = "Username, or @me for the current user")),
    responses(
        (status = 200, description = "All-time project totals, largest first", body = TopProjectsResponse),
        (status = 401, description = "Missing session token")
    ),
    tag = "users"
)]
pub async fn get_top_projects(
    CurrentSession(session): CurrentSession,
    Path(username): Path<String>,
) -> Result<Json<TopProjectsResponse>> {
    let entries = session.api().activity_data(&username).await?;
    let totals = all_time_top_projects(&entries);
    tracing::debug!(
        username = %username,
        entries = entries.len(),
        projects = totals.len(),
        "Aggregated top projects"
    );

    Ok(Json(TopProjectsResponse {
        total_duration: totals.iter().map(|total| total.duration).sum(),
        projects: totals.into_iter().map(TopProject::from).collect(),
        username,
    }))
}
