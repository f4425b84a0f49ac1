// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, auth, profile, report, skill},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, profile, assessments, attempts, reports, skills, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
        HeaderValue::from_static("http://localhost:5173"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let profile_routes = Router::new()
        .route("/", get(profile::get_profile).put(profile::update_profile))
        .layer(auth_layer.clone());

    let assessment_routes = Router::new()
        .route("/", get(assessment::list_assessments))
        .route("/{id}", get(assessment::get_assessment))
        .route("/{id}/questions", get(assessment::list_questions))
        // Protected assessment routes
        .merge(
            Router::new()
                .route("/{id}/submit", post(assessment::submit_assessment))
                .layer(auth_layer.clone()),
        );

    let attempt_routes = Router::new()
        .route("/history", get(report::get_history))
        .route("/{id}/report", post(report::regenerate_report))
        .layer(auth_layer.clone());

    let report_routes = Router::new()
        .route("/{id}", get(report::get_report))
        .layer(auth_layer.clone());

    let skill_routes = Router::new()
        .route("/", get(skill::list_skills))
        .route("/recommended", get(skill::recommended_skills))
        .layer(auth_layer.clone());

    let admin_routes = Router::new()
        .route("/assessments", post(assessment::create_assessment))
        .route("/assessments/{id}/questions", post(assessment::add_question))
        .route("/skills", post(skill::create_skill))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth_layer);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/assessments", assessment_routes)
        .nest("/api/user-assessments", attempt_routes)
        .nest("/api/reports", report_routes)
        .nest("/api/skills", skill_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
