//! Session middleware configuration.
//!
//! Sessions are stored server-side (SQLite in production, memory in tests)
//! and keyed by a signed cookie.

use secrecy::ExposeSecret;
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::RankingConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ranking_session";

/// Sliding inactivity window for every session.
pub const SESSION_INACTIVITY: tower_sessions::cookie::time::Duration =
    tower_sessions::cookie::time::Duration::hours(1);

/// Derive the 64-byte cookie signing key from the session secret.
#[must_use]
pub fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Create the session layer around `store`.
///
/// The cookie is signed, `HttpOnly`, `SameSite=Lax`, and `Secure` when the
/// base URL is https.
#[must_use]
pub fn create_session_layer<S: SessionStore>(
    store: S,
    config: &RankingConfig,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(SESSION_INACTIVITY))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(config.session_secret.expose_secret()))
}
