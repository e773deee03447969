//! HTTP route handlers for the ranking server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Redirect by role
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (database)
//! GET  /favicon.ico              - Ranking logo or 204
//!
//! # Ambassador
//! GET  /login                    - Login page
//! POST /login                    - Login (JSON or form)
//! GET  /dashboard                - Personal dashboard
//! GET  /api/user                 - Profile JSON
//! GET  /api/ranking/top3         - Leaderboard JSON
//! GET  /logout, POST /logout     - Ambassador logout
//!
//! # Administrator
//! GET  /admin                    - Redirect to login
//! GET  /admin/login              - Login page
//! POST /admin/login              - Login (JSON or form)
//! GET  /admin/dashboard          - Stats and ambassador list
//! GET  /admin/api/users          - List ambassadors
//! POST /admin/api/user           - Create ambassador
//! GET  /admin/api/user/{id}      - Fetch ambassador
//! PUT  /admin/api/user/{id}      - Update sales, lists, goal
//! DELETE /admin/api/user/{id}    - Delete ambassador
//! GET  /admin/logout, POST       - Administrator logout
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the ambassador routes router.
pub fn ambassador_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/api/user", get(dashboard::current_user))
        .route("/api/ranking/top3", get(dashboard::ranking_top3))
}

/// Create the administrator routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::admin_home))
        .route(
            "/login",
            get(auth::admin_login_page).post(auth::admin_login),
        )
        .route("/logout", get(auth::admin_logout).post(auth::admin_logout))
        .route("/dashboard", get(admin::dashboard))
        .route("/api/users", get(admin::list_ambassadors))
        .route("/api/user", post(admin::create_ambassador))
        .route(
            "/api/user/{id}",
            get(admin::get_ambassador)
                .put(admin::update_ambassador)
                .delete(admin::delete_ambassador),
        )
}

/// Create all routes for the ranking server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/health/ready", get(home::readiness))
        .route("/favicon.ico", get(home::favicon))
        .merge(ambassador_routes())
        .nest("/admin", admin_routes())
}
