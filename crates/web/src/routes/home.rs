//! Root, health and favicon handlers.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::{OptionalAdministrator, OptionalAmbassador};
use crate::state::AppState;

/// Favicon file looked up in the images directory.
pub const FAVICON_FILE: &str = "logo-ranking.png";

/// Send the caller to the page for the role they hold.
///
/// An administrator session wins over an ambassador session.
pub async fn home(
    OptionalAdministrator(administrator): OptionalAdministrator,
    OptionalAmbassador(ambassador): OptionalAmbassador,
) -> Redirect {
    if administrator.is_some() {
        Redirect::to("/admin/dashboard")
    } else if ambassador.is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Serve the ranking logo as the favicon, or `204` if there is none.
pub async fn favicon(State(state): State<AppState>) -> Response {
    let path = state.config().images_dir.join(FAVICON_FILE);
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(_) => StatusCode::NO_CONTENT.into_response(),
    }
}
