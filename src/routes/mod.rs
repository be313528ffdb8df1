use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod health;
pub mod membership;
pub mod rankings;
pub mod scores;
pub mod submissions;
pub mod support;
pub mod teams;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let teams_routes = Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route("/mine", get(teams::my_team))
        .route("/:id/scores", get(teams::team_scores));

    let join_request_routes = Router::new()
        .route("/", post(membership::send_join_request))
        .route("/mine", get(membership::my_join_requests))
        .route("/team", get(membership::team_join_requests))
        .route("/:id", delete(membership::cancel_join_request))
        .route("/:id/accept", post(membership::accept_join_request))
        .route("/:id/reject", post(membership::reject_join_request));

    let invitation_routes = Router::new()
        .route("/", post(membership::send_invitation))
        .route("/mine", get(membership::my_invitations))
        .route("/:id/accept", post(membership::accept_invitation))
        .route("/:id/reject", post(membership::reject_invitation));

    let support_routes = Router::new()
        .route("/", post(support::file_message))
        .route("/mine", get(support::my_messages))
        .route("/inbox", get(support::inbox))
        .route("/:id/progress", post(support::mark_in_progress))
        .route("/:id/resolve", post(support::resolve_message));

    let submission_routes = Router::new()
        .route("/", put(submissions::upsert_submission))
        .route("/mine", get(submissions::my_submission));

    let admin_routes = Router::new()
        .route("/teams/:id/status", patch(admin::set_team_status))
        .route("/teams/:id/location", patch(admin::assign_team_location))
        .route(
            "/teams/:id/members/:user_id",
            delete(admin::remove_team_member),
        )
        .route("/themes", post(admin::create_theme))
        .route("/rounds", post(admin::create_round))
        .route("/floors", post(admin::create_floor))
        .route("/rooms", post(admin::create_room))
        .route(
            "/mentor-assignments",
            post(admin::create_mentor_assignment),
        )
        .route("/settings", patch(admin::update_settings));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/teams", teams_routes)
        .nest("/api/join-requests", join_request_routes)
        .nest("/api/invitations", invitation_routes)
        .nest("/api/support", support_routes)
        .nest("/api/submissions", submission_routes)
        .nest("/api/admin", admin_routes)
        .route("/api/rounds", get(scores::list_rounds))
        .route("/api/scores", post(scores::submit_score))
        .route("/api/mentor/teams", get(scores::mentor_teams))
        .route("/api/rankings", get(rankings::get_rankings))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 256))
}
