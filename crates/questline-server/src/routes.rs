//! Route table for the Questline API.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower::Layer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{
    auth, catalog, health, leaderboard, missions, profile, progress, ranks, tasks,
};
use crate::state::AppStateArc;

// ============================================================================
// Route groups
// ============================================================================

pub fn auth_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/jwt/create", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/jwt/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/verify-email", get(auth::verify_email))
        .route("/api/auth/password-reset", post(auth::password_reset))
        .route("/api/auth/password-reset-confirm", post(auth::password_reset_confirm))
}

pub fn profile_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/profile", get(profile::get_profile).patch(profile::patch_profile))
        .route("/api/profile/me", get(profile::get_profile).patch(profile::patch_profile))
        .route("/api/class-roles", get(profile::list_class_roles))
}

pub fn catalog_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/tracks", get(catalog::list_tracks).post(catalog::create_track))
        .route(
            "/api/tracks/:id",
            get(catalog::get_track)
                .patch(catalog::update_track)
                .delete(catalog::delete_track),
        )
        .route("/api/locations", get(catalog::list_locations).post(catalog::create_location))
        .route(
            "/api/locations/:id",
            get(catalog::get_location)
                .patch(catalog::update_location)
                .delete(catalog::delete_location),
        )
        .route("/api/missions", get(missions::list_missions).post(missions::create_mission))
        .route(
            "/api/missions/:id",
            get(missions::get_mission)
                .patch(missions::update_mission)
                .delete(missions::delete_mission),
        )
        .route("/api/mission-tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/mission-tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/api/ranks", get(ranks::list_ranks))
        .route("/api/ranks/:id", get(ranks::get_rank))
}

pub fn progress_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/missions/:id/start", post(missions::start))
        .route("/api/missions/:id/complete", post(missions::complete))
        .route("/api/progress", get(progress::list_progress))
        .route("/api/progress/:id", get(progress::get_progress))
        .route("/api/mission-tasks/:id/submit", post(tasks::submit))
        .route(
            "/api/task-progress",
            get(tasks::list_task_progress).post(tasks::create_task_progress),
        )
        .route(
            "/api/task-progress/:id",
            get(tasks::get_task_progress)
                .patch(tasks::update_task_progress)
                .delete(tasks::delete_task_progress),
        )
        .route("/api/leaderboard", get(leaderboard::list_leaderboard))
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/healthz", get(health::healthz))
}

// ============================================================================
// Application
// ============================================================================

/// The full application: every route group plus tracing, CORS and
/// trailing-slash normalization.
pub fn app(state: AppStateArc) -> NormalizePath<Router> {
    let cors = cors_layer(&state.config.http.cors_allowed_origins);
    let router = Router::new()
        .merge(auth_routes())
        .merge(profile_routes())
        .merge(catalog_routes())
        .merge(progress_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// An empty origin list allows reads from anywhere.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT_LANGUAGE])
        .allow_credentials(true)
}
