//! Integration tests for Ambassador Ranking.
//!
//! Each test builds the full application router over a private in-memory
//! database and drives it with `tower::ServiceExt::oneshot`, carrying the
//! session cookie between requests the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ranking-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::str::FromStr;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use ranking_core::{AmbassadorId, Email};
use ranking_web::build_app;
use ranking_web::config::{DefaultAdminConfig, RankingConfig, SecretSource};
use ranking_web::db;
use ranking_web::middleware::session::SESSION_COOKIE_NAME;
use ranking_web::models::Ambassador;
use ranking_web::services::roster::{AmbassadorChanges, NewAmbassadorRequest, RosterService};
use ranking_web::services::seed::ensure_default_administrator;
use ranking_web::state::AppState;

/// Username of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";
/// Password of the seeded administrator.
pub const ADMIN_PASSWORD: &str = "admin-pass-123";
/// Password given to every ambassador created through [`TestContext::create_ambassador`].
pub const AMBASSADOR_PASSWORD: &str = "secret1";

/// A response with its body already read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }

    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Application under test plus a one-browser cookie jar.
pub struct TestContext {
    pub app: Router,
    pub pool: SqlitePool,
    cookie: Option<String>,
}

impl TestContext {
    /// Build the application over a fresh database with the default
    /// administrator seeded.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be set up.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        let pool = db::connect_in_memory()
            .await
            .expect("in-memory database");
        let config = test_config();

        ensure_default_administrator(&pool, &config.default_admin)
            .await
            .expect("seed administrator");

        let state = AppState::new(config, pool.clone());
        let app = build_app(state, MemoryStore::default());

        Self {
            app,
            pool,
            cookie: None,
        }
    }

    /// Forget the session cookie, as a new browser would.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// Send a request and remember any session cookie it sets.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("cookie header value"),
            );
        }

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        self.track_cookies(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn track_cookies(&mut self, headers: &HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if !pair.starts_with(&prefix) {
                continue;
            }

            let removed = pair.len() == prefix.len()
                || value.to_ascii_lowercase().contains("max-age=0");
            self.cookie = if removed {
                None
            } else {
                Some(pair.to_owned())
            };
        }
    }

    /// `GET` as a browser.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(request(Method::GET, uri, None, "text/html")).await
    }

    /// `GET` as an API client.
    pub async fn get_json(&mut self, uri: &str) -> TestResponse {
        self.send(request(Method::GET, uri, None, "application/json"))
            .await
    }

    /// Send a JSON body.
    pub async fn send_json(&mut self, method: Method, uri: &str, body: &Value) -> TestResponse {
        self.send(request(method, uri, Some(body), "application/json"))
            .await
    }

    /// Submit an HTML form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::expect_used)]
    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_owned()))
            .expect("request");
        self.send(request).await
    }

    /// Log in as an ambassador through the JSON API.
    pub async fn login_ambassador(&mut self, cpf: &str) -> TestResponse {
        self.send_json(
            Method::POST,
            "/login",
            &serde_json::json!({ "cpf": cpf, "password": AMBASSADOR_PASSWORD }),
        )
        .await
    }

    /// Log in as the seeded administrator through the JSON API.
    pub async fn login_administrator(&mut self) -> TestResponse {
        self.send_json(
            Method::POST,
            "/admin/login",
            &serde_json::json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
        )
        .await
    }

    /// Create an ambassador directly through the roster service.
    ///
    /// # Panics
    ///
    /// Panics if the ambassador cannot be created.
    #[allow(clippy::expect_used)]
    pub async fn create_ambassador(&self, name: &str, cpf: &str) -> Ambassador {
        RosterService::new(&self.pool)
            .create(&NewAmbassadorRequest {
                name: name.to_owned(),
                cpf: cpf.to_owned(),
                password: AMBASSADOR_PASSWORD.to_owned(),
            })
            .await
            .expect("create ambassador")
    }

    /// Set an ambassador's total sales.
    ///
    /// # Panics
    ///
    /// Panics if the update fails.
    #[allow(clippy::expect_used)]
    pub async fn set_sales(&self, id: AmbassadorId, total_sales: &str) -> Ambassador {
        RosterService::new(&self.pool)
            .update(
                id,
                AmbassadorChanges {
                    total_sales: Some(Decimal::from_str(total_sales).expect("decimal")),
                    ..AmbassadorChanges::default()
                },
            )
            .await
            .expect("update ambassador")
    }
}

#[allow(clippy::expect_used)]
fn request(method: Method, uri: &str, body: Option<&Value>, accept: &str) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ACCEPT, accept);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request")
}

#[allow(clippy::expect_used)]
fn test_config() -> RankingConfig {
    RankingConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 5000,
        base_url: "http://localhost:5000".to_owned(),
        session_secret: SecretString::from("0123456789abcdef0123456789abcdef0123456789abcdef"),
        session_secret_source: SecretSource::Environment,
        default_admin: DefaultAdminConfig {
            username: ADMIN_USERNAME.to_owned(),
            email: Email::parse("admin@example.com").expect("email"),
            name: "Administrator".to_owned(),
            password: Some(SecretString::from(ADMIN_PASSWORD)),
            password_file: PathBuf::from("/nonexistent/ranking-admin-password"),
        },
        images_dir: PathBuf::from("/nonexistent/ranking-images"),
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../web/static")),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}
