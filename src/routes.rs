// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exams, profile, results, sessions},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: auth and the exam catalog.
/// * Everything else sits behind `auth_middleware`.
/// * Applies global middleware (Trace, CORS) and injects `AppState`.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let exam_routes = Router::new()
        .route("/eligibility", get(exams::eligibility))
        .route("/{category}/sessions", post(exams::start_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Public catalog
        .route("/", get(exams::list_exams));

    let session_routes = Router::new()
        .route(
            "/{id}",
            get(sessions::get_session).delete(sessions::abandon_session),
        )
        .route("/{id}/answers/{question_id}", put(sessions::record_answer))
        .route("/{id}/next", post(sessions::next_question))
        .route("/{id}/previous", post(sessions::previous_question))
        .route("/{id}/cursor", put(sessions::move_cursor))
        .route("/{id}/submit", post(sessions::submit_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let account_routes = Router::new()
        .route("/api/results", get(results::list_results))
        .route("/api/dashboard", get(results::dashboard))
        .route("/api/profile/me", get(profile::get_me).put(profile::update_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/sessions", session_routes)
        .merge(account_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
