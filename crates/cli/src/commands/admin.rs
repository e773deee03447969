//! Administrator management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new administrator
//! ranking-cli admin create -u maria -e maria@example.com -n "Maria Souza"
//!
//! # Reset a password
//! ranking-cli admin set-password -u admin
//! ```
//!
//! Passwords are read twice, so they never appear in shell history. On a
//! terminal they are read without echo; piping two lines to stdin works for
//! scripted use.

use std::io::{self, BufRead, IsTerminal, Write};

use thiserror::Error;

use ranking_core::{Email, EmailError};
use ranking_web::db::{self, AdministratorRepository, RepositoryError};
use ranking_web::services::auth::{self, AuthError, AuthService};

/// Errors that can occur during administrator operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Username already taken.
    #[error("Administrator already exists: {0}")]
    AdministratorExists(String),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Password rejected or could not be stored.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Reading from stdin failed.
    #[error("Could not read password: {0}")]
    Io(#[from] io::Error),
}

/// Create a new administrator.
///
/// # Returns
///
/// The ID of the created administrator.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid, the username or email is
/// taken, or the password is rejected.
pub async fn create_administrator(
    username: &str,
    email: &str,
    name: &str,
) -> Result<i64, AdminError> {
    let email = Email::parse(email)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&super::database_url()).await?;
    db::migrate(&pool).await?;

    let repo = AdministratorRepository::new(&pool);
    if repo.username_exists(username).await? {
        return Err(AdminError::AdministratorExists(username.to_owned()));
    }

    let password = read_new_password(stdin_prompt)?;
    auth::validate_password(&password)?;
    let password_hash = auth::hash_password(&password)?;

    let administrator = repo
        .create(username, &email, name, &password_hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::AdministratorExists(username.to_owned()),
            other => AdminError::Database(other),
        })?;

    tracing::info!(
        "Administrator created successfully! ID: {}, Username: {}, Email: {}",
        administrator.id,
        administrator.username,
        administrator.email
    );

    Ok(administrator.id.as_i64())
}

/// Replace an administrator's password.
///
/// # Errors
///
/// Returns `AdminError` if the passwords differ, the password is too short,
/// or no administrator has this username.
pub async fn set_password(username: &str) -> Result<(), AdminError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&super::database_url()).await?;
    db::migrate(&pool).await?;

    let password = read_new_password(stdin_prompt)?;
    AuthService::new(&pool)
        .change_administrator_password(username, &password)
        .await?;

    tracing::info!("Password updated for {}", username);
    Ok(())
}

/// Ask for a password and its confirmation.
fn read_new_password(
    mut prompt: impl FnMut(&str) -> io::Result<String>,
) -> Result<String, AdminError> {
    let password = prompt("New password: ")?;
    let confirmation = prompt("Confirm password: ")?;

    if password != confirmation {
        return Err(AdminError::PasswordMismatch);
    }
    Ok(password)
}

/// No echo on a terminal, plain lines otherwise.
fn stdin_prompt(prompt: &str) -> io::Result<String> {
    if io::stdin().is_terminal() {
        rpassword::prompt_password(prompt)
    } else {
        prompt_line(&mut io::stdin().lock(), prompt)
    }
}

fn prompt_line(input: &mut impl BufRead, prompt: &str) -> io::Result<String> {
    #[allow(clippy::print_stderr)]
    {
        eprint!("{prompt}");
    }
    io::stderr().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
