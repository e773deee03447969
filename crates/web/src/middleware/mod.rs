//! HTTP middleware stack for the ranking server.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions, signed cookie)
//!
//! The role extractors in [`auth`] read the session through
//! [`IdentitySession`].

pub mod auth;
pub mod identity;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAdministrator, OptionalAmbassador, RequireAdministrator,
    RequireAmbassador, wants_json,
};
pub use identity::IdentitySession;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
