//! Authentication extractors.
//!
//! One extractor per role. Each only looks at its own session slot, so an
//! administrator session never satisfies [`RequireAmbassador`] and vice
//! versa. A missing identity is answered with `401` JSON for API callers and
//! a redirect to the role's login page for browsers.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use super::identity::IdentitySession;
use crate::error::AppError;
use crate::models::{Administrator, Ambassador, IdentityKind};
use crate::state::AppState;

/// Extractor that requires a signed-in ambassador.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAmbassador(ambassador): RequireAmbassador) -> impl IntoResponse {
///     format!("Hello, {}!", ambassador.name)
/// }
/// ```
pub struct RequireAmbassador(pub Ambassador);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdministrator(pub Administrator);

/// Extractor that optionally gets the signed-in ambassador.
pub struct OptionalAmbassador(pub Option<Ambassador>);

/// Extractor that optionally gets the signed-in administrator.
pub struct OptionalAdministrator(pub Option<Administrator>);

/// Error returned when a role is required but missing.
#[derive(Debug)]
pub enum AuthRejection {
    /// No identity of this kind on the session.
    LoginRequired {
        kind: IdentityKind,
        /// The caller asked for JSON.
        json: bool,
    },
    /// Session or database failure while checking.
    Failed(AppError),
}

impl From<AppError> for AuthRejection {
    fn from(err: AppError) -> Self {
        Self::Failed(err)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::LoginRequired { kind, json: true } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "message": kind.login_required_message(),
                    "redirect": kind.login_path(),
                })),
            )
                .into_response(),
            Self::LoginRequired { kind, json: false } => {
                Redirect::to(kind.login_path()).into_response()
            }
            Self::Failed(err) => err.into_response(),
        }
    }
}

/// Returns `true` if the request declares or accepts JSON.
#[must_use]
pub fn wants_json(headers: &HeaderMap) -> bool {
    let content_type_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("application/json"));
    let accepts_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    content_type_json || accepts_json
}

impl FromRequestParts<AppState> for RequireAmbassador {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = IdentitySession::from_request_parts(parts, state).await?;
        identity
            .current_ambassador(state.pool())
            .await?
            .map(Self)
            .ok_or_else(|| AuthRejection::LoginRequired {
                kind: IdentityKind::Ambassador,
                json: wants_json(&parts.headers),
            })
    }
}

impl FromRequestParts<AppState> for RequireAdministrator {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = IdentitySession::from_request_parts(parts, state).await?;
        identity
            .current_administrator(state.pool())
            .await?
            .map(Self)
            .ok_or_else(|| AuthRejection::LoginRequired {
                kind: IdentityKind::Administrator,
                json: wants_json(&parts.headers),
            })
    }
}

impl FromRequestParts<AppState> for OptionalAmbassador {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = IdentitySession::from_request_parts(parts, state).await?;
        Ok(Self(identity.current_ambassador(state.pool()).await?))
    }
}

impl FromRequestParts<AppState> for OptionalAdministrator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = IdentitySession::from_request_parts(parts, state).await?;
        Ok(Self(identity.current_administrator(state.pool()).await?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_wants_json() {
        assert!(wants_json(&headers(&[(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8"
        )])));
        assert!(wants_json(&headers(&[(
            header::ACCEPT,
            "text/html, application/json;q=0.9"
        )])));
        assert!(!wants_json(&headers(&[(header::ACCEPT, "text/html")])));
        assert!(!wants_json(&headers(&[(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded"
        )])));
        assert!(!wants_json(&HeaderMap::new()));
    }

    #[test]
    fn test_browser_rejection_redirects() {
        let response = AuthRejection::LoginRequired {
            kind: IdentityKind::Administrator,
            json: false,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    }

    #[tokio::test]
    async fn test_json_rejection_is_401_with_redirect() {
        let response = AuthRejection::LoginRequired {
            kind: IdentityKind::Ambassador,
            json: true,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["redirect"], "/login");
    }
}
