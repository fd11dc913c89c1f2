use axum::{
    Json,
    extract::Path,
    http::StatusCode,
    response,
};

use common::{
    leaderboards::JoinLeaderboardError,
    utils::error::Result,
};

use crate::{
    middleware::CurrentSession,
    models::leaderboard::{
        CreateLeaderboardRequest, InviteCodeResponse, JoinLeaderboardRequest, JoinedLeaderboard,
        LeaderboardDetail, LeaderboardOverview, MemberActionRequest,
    },
};

#[utoipa::path(
    get,
    path = "/v1/leaderboards",
    responses(
        (status = 200, description = "Leaderboards of the current user", body = Vec<LeaderboardOverview>),
        (status = 303, description = "Upstream rate limit, redirects to /rate-limited"),
        (status = 401, description = "Missing session token")
    ),
    tag = "leaderboards"
)]
pub async fn list_leaderboards(
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<LeaderboardOverview>>> {
    let user = session.current_user().await?;
    let combined = session.leaderboards.load_all().await?;

    Ok(Json(
        combined
            .iter()
            .map(|leaderboard| LeaderboardOverview::new(leaderboard, &user.username))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/leaderboards/{name}",
    params(("name" = String, Path, description = "Leaderboard name")),
    responses(
        (status = 200, description = "Leaderboard with ranked members", body = LeaderboardDetail),
        (status = 404, description = "Leaderboard not found")
    ),
    tag = "leaderboards"
)]
pub async fn get_leaderboard(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
) -> Result<Json<LeaderboardDetail>> {
    let data = session.leaderboards.leaderboard(&name).await?;
    Ok(Json(LeaderboardDetail::from(data)))
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/join",
    request_body = JoinLeaderboardRequest,
    responses(
        (status = 200, description = "Joined leaderboard", body = JoinedLeaderboard),
        (status = 404, description = "No leaderboard uses this invite"),
        (status = 409, description = "Already a member")
    ),
    tag = "leaderboards"
)]
pub async fn join_leaderboard(
    CurrentSession(session): CurrentSession,
    Json(request): Json<JoinLeaderboardRequest>,
) -> std::result::Result<Json<JoinedLeaderboard>, JoinLeaderboardError> {
    let joined = session.leaderboards.join(request.invite.trim()).await?;
    Ok(Json(JoinedLeaderboard::from(joined)))
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/create",
    request_body = CreateLeaderboardRequest,
    responses(
        (status = 200, description = "Created leaderboard", body = InviteCodeResponse),
        (status = 400, description = "Invalid leaderboard name"),
        (status = 409, description = "Name already taken")
    ),
    tag = "leaderboards"
)]
pub async fn create_leaderboard(
    CurrentSession(session): CurrentSession,
    Json(request): Json<CreateLeaderboardRequest>,
) -> response::Result<Json<InviteCodeResponse>> {
    request.validate()?;

    let invite = session.leaderboards.create(&request.name).await?;

    Ok(Json(InviteCodeResponse {
        invite_code: invite.invite_code,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/{name}/leave",
    params(("name" = String, Path, description = "Leaderboard name")),
    responses((status = 204, description = "Left leaderboard")),
    tag = "leaderboards"
)]
pub async fn leave_leaderboard(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    session.leaderboards.leave(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/leaderboards/{name}",
    params(("name" = String, Path, description = "Leaderboard name")),
    responses(
        (status = 204, description = "Deleted leaderboard"),
        (status = 403, description = "Not an admin of this leaderboard")
    ),
    tag = "leaderboards"
)]
pub async fn delete_leaderboard(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    session.leaderboards.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/{name}/promote",
    params(("name" = String, Path, description = "Leaderboard name")),
    request_body = MemberActionRequest,
    responses((status = 204, description = "Member is now an admin")),
    tag = "leaderboards"
)]
pub async fn promote_member(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
    Json(request): Json<MemberActionRequest>,
) -> Result<StatusCode> {
    session.leaderboards.promote(&name, &request.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/{name}/demote",
    params(("name" = String, Path, description = "Leaderboard name")),
    request_body = MemberActionRequest,
    responses((status = 204, description = "Member is no longer an admin")),
    tag = "leaderboards"
)]
pub async fn demote_member(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
    Json(request): Json<MemberActionRequest>,
) -> Result<StatusCode> {
    session.leaderboards.demote(&name, &request.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/{name}/kick",
    params(("name" = String, Path, description = "Leaderboard name")),
    request_body = MemberActionRequest,
    responses((status = 204, description = "Member removed")),
    tag = "leaderboards"
)]
pub async fn kick_member(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
    Json(request): Json<MemberActionRequest>,
) -> Result<StatusCode> {
    session.leaderboards.kick(&name, &request.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/leaderboards/{name}/regenerate",
    params(("name" = String, Path, description = "Leaderboard name")),
    responses((status = 200, description = "New invite code", body = InviteCodeResponse)),
    tag = "leaderboards"
)]
pub async fn regenerate_invite(
    CurrentSession(session): CurrentSession,
    Path(name): Path<String>,
) -> Result<Json<InviteCodeResponse>> {
    let invite_code = session.leaderboards.regenerate_invite_code(&name).await?;
    Ok(Json(InviteCodeResponse { invite_code }))
}
