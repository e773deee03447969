//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `RANKING_DATABASE_URL` - SQLite URL (fallback: `DATABASE_URL`,
//!   default: `sqlite://database/ranking.db`)
//! - `RANKING_HOST` - Bind address (fallback: `HOST`, default: 0.0.0.0)
//! - `RANKING_PORT` - Listen port (fallback: `PORT`, default: 5000)
//! - `RANKING_BASE_URL` - Public URL; `https://` turns on secure cookies
//!   (default: `http://localhost:5000`)
//! - `RANKING_SESSION_SECRET` - Cookie signing secret (fallback: `SECRET_KEY`).
//!   When neither is set the secret is read from, or generated into,
//!   `RANKING_SECRET_FILE` (default: `.secret_key`)
//! - `RANKING_ADMIN_USERNAME` / `RANKING_ADMIN_EMAIL` / `RANKING_ADMIN_NAME` /
//!   `RANKING_ADMIN_PASSWORD` - Administrator seeded on first start
//! - `RANKING_ADMIN_PASSWORD_FILE` - Where a generated administrator password
//!   is written (default: `.admin_password`)
//! - `RANKING_IMAGES_DIR` - Images and favicon (default: `images`)
//! - `RANKING_STATIC_DIR` - CSS and JS (default: `crates/web/static`)
//! - `RANKING_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use ranking_core::Email;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Random bytes in a generated session secret (hex encoded, so 64 chars).
const GENERATED_SECRET_BYTES: usize = 32;

const DEFAULT_DATABASE_URL: &str = "sqlite://database/ranking.db";
const DEFAULT_SECRET_FILE: &str = ".secret_key";
const DEFAULT_ADMIN_PASSWORD_FILE: &str = ".admin_password";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RankingConfig {
    /// SQLite connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// Where the session secret came from, logged once tracing is up
    pub session_secret_source: SecretSource,
    /// Administrator created on first start
    pub default_admin: DefaultAdminConfig,
    /// Directory served under `/images`
    pub images_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// The administrator seeded when none with `username` exists.
#[derive(Debug, Clone)]
pub struct DefaultAdminConfig {
    pub username: String,
    pub email: Email,
    pub name: String,
    /// `None` means a random password is generated into `password_file`.
    pub password: Option<SecretString>,
    pub password_file: PathBuf,
}

impl RankingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the session
    /// secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(
            get_env_with_fallback("RANKING_DATABASE_URL", "DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
        );
        let host = get_env_with_fallback("RANKING_HOST", "HOST")
            .unwrap_or_else(|| "0.0.0.0".to_owned())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RANKING_HOST".to_owned(), e.to_string()))?;
        let port = get_env_with_fallback("RANKING_PORT", "PORT")
            .unwrap_or_else(|| "5000".to_owned())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RANKING_PORT".to_owned(), e.to_string()))?;
        let base_url = get_env_or_default("RANKING_BASE_URL", "http://localhost:5000");

        let secret_file = PathBuf::from(get_env_or_default("RANKING_SECRET_FILE", DEFAULT_SECRET_FILE));
        let (session_secret, session_secret_source) = resolve_secret(
            get_env_with_fallback("RANKING_SESSION_SECRET", "SECRET_KEY"),
            || std::fs::read_to_string(&secret_file),
            |secret| write_secret_file(&secret_file, secret),
        )?;

        let default_admin = DefaultAdminConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            session_secret_source,
            default_admin,
            images_dir: PathBuf::from(get_env_or_default("RANKING_IMAGES_DIR", "images")),
            static_dir: PathBuf::from(get_env_or_default("RANKING_STATIC_DIR", "crates/web/static")),
            log_json: get_optional_env("RANKING_LOG_JSON").is_some(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl DefaultAdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let email = get_env_or_default("RANKING_ADMIN_EMAIL", "admin@example.com");
        let email = Email::parse(&email).map_err(|e| {
            ConfigError::InvalidEnvVar("RANKING_ADMIN_EMAIL".to_owned(), e.to_string())
        })?;

        Ok(Self {
            username: get_env_or_default("RANKING_ADMIN_USERNAME", "admin"),
            email,
            name: get_env_or_default("RANKING_ADMIN_NAME", "Administrator"),
            password: get_optional_env("RANKING_ADMIN_PASSWORD").map(SecretString::from),
            password_file: PathBuf::from(get_env_or_default(
                "RANKING_ADMIN_PASSWORD_FILE",
                DEFAULT_ADMIN_PASSWORD_FILE,
            )),
        })
    }
}

// =============================================================================
// Session Secret
// =============================================================================

/// Where the session secret came from.
///
/// Configuration is loaded before the tracing subscriber exists, so the
/// outcome is kept and reported by [`SecretSource::log`] afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// `RANKING_SESSION_SECRET` or `SECRET_KEY`.
    Environment,
    /// The secret file.
    File,
    /// Freshly generated.
    Generated {
        /// Why the secret file was not used. `None` when it did not exist.
        unusable_file: Option<String>,
        /// Set when the new secret could not be written back.
        write_error: Option<String>,
    },
}

impl SecretSource {
    /// Report how the secret was obtained.
    pub fn log(&self) {
        match self {
            Self::Environment => tracing::debug!("Session secret read from the environment"),
            Self::File => tracing::debug!("Session secret read from the secret file"),
            Self::Generated {
                unusable_file,
                write_error,
            } => {
                match unusable_file {
                    Some(reason) => {
                        tracing::warn!(reason = %reason, "Secret file unusable, generated a new session secret");
                    }
                    None => tracing::info!("No session secret configured, generated one"),
                }
                if let Some(error) = write_error {
                    tracing::warn!(
                        error = %error,
                        "Could not persist generated session secret; sessions will not survive a restart"
                    );
                }
            }
        }
    }
}

/// Resolve the session signing secret.
///
/// In order of preference:
///
/// 1. `env_value`, if set (must pass the length and strength checks)
/// 2. the trimmed contents returned by `read_file`, if non-empty
/// 3. a freshly generated 64-char hex secret, handed to `write_file` so the
///    next start reuses it. A failed write keeps the secret in memory only,
///    which means sessions do not survive a restart.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the environment or file secret is
/// too short or looks like a placeholder.
pub fn resolve_secret(
    env_value: Option<String>,
    read_file: impl FnOnce() -> io::Result<String>,
    write_file: impl FnOnce(&str) -> io::Result<()>,
) -> Result<(SecretString, SecretSource), ConfigError> {
    if let Some(value) = env_value.filter(|v| !v.trim().is_empty()) {
        let secret = SecretString::from(value);
        validate_session_secret(&secret, "RANKING_SESSION_SECRET")?;
        validate_secret_strength(secret.expose_secret(), "RANKING_SESSION_SECRET")?;
        return Ok((secret, SecretSource::Environment));
    }

    let unusable_file = match read_file() {
        Ok(contents) if !contents.trim().is_empty() => {
            let secret = SecretString::from(contents.trim().to_owned());
            validate_session_secret(&secret, "RANKING_SECRET_FILE")?;
            return Ok((secret, SecretSource::File));
        }
        Ok(_) => Some("file is empty".to_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => Some(e.to_string()),
    };

    let generated = generate_secret();
    let write_error = write_file(&generated).err().map(|e| e.to_string());
    Ok((
        SecretString::from(generated),
        SecretSource::Generated {
            unusable_file,
            write_error,
        },
    ))
}

fn generate_secret() -> String {
    let mut bytes = [0_u8; GENERATED_SECRET_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Write the secret readable by the owner only.
pub(crate) fn write_secret_file(path: &Path, secret: &str) -> io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(secret.as_bytes())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable, falling back to a generic name.
fn get_env_with_fallback(primary_key: &str, fallback_key: &str) -> Option<String> {
    get_optional_env(primary_key).or_else(|| get_optional_env(fallback_key))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, source: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            source.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, source: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            source.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            source.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
