mod handlers;
mod middleware;
mod models;
mod session;

use std::sync::Arc;

use axum::{
    Json, Router,
    response::Html,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use common::{
    ApiError, TrackerApi,
    utils::{config::Config, error::{RATE_LIMITED_PATH, Result}},
};

use handlers::{
    activity::{get_activity_status, rate_limited},
    leaderboards::{
        create_leaderboard, delete_leaderboard, demote_member, get_leaderboard, join_leaderboard,
        kick_member, leave_leaderboard, list_leaderboards, promote_member, regenerate_invite,
    },
    projects::get_top_projects,
};
use session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub api: TrackerApi,
    pub sessions: Arc<SessionStore>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timeboard",
        description = "Dashboard backend for a coding-time tracker: shared leaderboards, project totals and live activity.",
        version = "0.1.0",
        license(
            name = "MIT OR Apache-2.0",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        handlers::leaderboards::list_leaderboards,
        handlers::leaderboards::get_leaderboard,
        handlers::leaderboards::join_leaderboard,
        handlers::leaderboards::create_leaderboard,
        handlers::leaderboards::leave_leaderboard,
        handlers::leaderboards::delete_leaderboard,
        handlers::leaderboards::promote_member,
        handlers::leaderboards::demote_member,
        handlers::leaderboards::kick_member,
        handlers::leaderboards::regenerate_invite,
        handlers::projects::get_top_projects,
        handlers::activity::get_activity_status,
        handlers::activity::rate_limited,
    ),
    components(
        schemas(
            models::leaderboard::MemberEntry,
            models::leaderboard::LeaderboardOverview,
            models::leaderboard::LeaderboardDetail,
            models::leaderboard::JoinedLeaderboard,
            models::leaderboard::InviteCodeResponse,
            models::leaderboard::JoinLeaderboardRequest,
            models::leaderboard::CreateLeaderboardRequest,
            models::leaderboard::MemberActionRequest,
            models::project::TopProject,
            models::project::TopProjectsResponse,
        )
    ),
    tags(
        (name = "leaderboards", description = "Leaderboard membership and administration"),
        (name = "users", description = "Per-user statistics"),
        (name = "activity", description = "Live activity proxy"),
    )
)]
struct ApiDoc;

async fn serve_docs() -> Html<String> {
    Html(Scalar::new(ApiDoc::openapi()).to_html())
}

async fn serve_openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/v1/leaderboards", get(list_leaderboards))
        .route("/v1/leaderboards/join", post(join_leaderboard))
        .route("/v1/leaderboards/create", post(create_leaderboard))
        .route(
            "/v1/leaderboards/{name}",
            get(get_leaderboard).delete(delete_leaderboard),
        )
        .route("/v1/leaderboards/{name}/leave", post(leave_leaderboard))
        .route("/v1/leaderboards/{name}/promote", post(promote_member))
        .route("/v1/leaderboards/{name}/demote", post(demote_member))
        .route("/v1/leaderboards/{name}/kick", post(kick_member))
        .route("/v1/leaderboards/{name}/regenerate", post(regenerate_invite))
        .route("/v1/users/{username}/top-projects", get(get_top_projects))
        .route("/api/activity-status/{username}", get(get_activity_status))
        .route(RATE_LIMITED_PATH, get(rate_limited))
        .route("/api-docs/openapi.json", get(serve_openapi_json))
        .route("/v1/docs", get(serve_docs))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(middleware::request_logger)),
        )
}

fn spawn_session_pruner(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sessions.idle_after().max(std::time::Duration::from_secs(60)));
        loop {
            ticker.tick().await;
            let removed = sessions.prune_idle();
            if removed > 0 {
                tracing::info!(removed, remaining = sessions.len(), "Pruned idle sessions");
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| ApiError::Config("Failed to install crypto provider".to_string()))?;

    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let api = TrackerApi::from_config(&config)?;
    let sessions = Arc::new(SessionStore::new(api.clone(), &config));
    spawn_session_pruner(Arc::clone(&sessions));

    let app_state = AppState { api, sessions };

    let app = create_router().with_state(app_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Timeboard starting on {}, tracking API at {}", addr, config.api_url);
    tracing::info!(
        "API documentation available at http://localhost:{}/v1/docs",
        config.api_port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
