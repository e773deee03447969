//! Default administrator on first start.

use std::io;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;

use super::auth::{AuthError, hash_password, validate_password};
use crate::config::{DefaultAdminConfig, write_secret_file};
use crate::db::{AdministratorRepository, RepositoryError};

const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Create the configured administrator unless one with that username exists.
///
/// Without a configured password a random one is generated and written to
/// `config.password_file`, readable by the owner only. The password itself
/// never reaches the logs. Returns `true` if an administrator was created.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the configured password is too short,
/// or `AuthError::Repository` if the database fails.
pub async fn ensure_default_administrator(
    pool: &SqlitePool,
    config: &DefaultAdminConfig,
) -> Result<bool, AuthError> {
    seed_administrator(pool, config, |password| {
        write_secret_file(&config.password_file, password)
    })
    .await
}

async fn seed_administrator(
    pool: &SqlitePool,
    config: &DefaultAdminConfig,
    save_generated: impl FnOnce(&str) -> io::Result<()>,
) -> Result<bool, AuthError> {
    let administrators = AdministratorRepository::new(pool);
    if administrators.username_exists(&config.username).await? {
        return Ok(false);
    }

    let (password, generated) = match &config.password {
        Some(password) => {
            validate_password(password.expose_secret())?;
            (password.expose_secret().to_owned(), false)
        }
        None => (generate_password(), true),
    };

    let password_hash = hash_password(&password)?;
    match administrators
        .create(&config.username, &config.email, &config.name, &password_hash)
        .await
    {
        Ok(admin) => {
            if !generated {
                tracing::info!(username = %admin.username, "Created default administrator");
            } else if let Err(e) = save_generated(&password) {
                tracing::warn!(
                    username = %admin.username,
                    error = %e,
                    "Created default administrator but could not save its generated password; set one with `ranking-cli admin set-password`"
                );
            } else {
                tracing::warn!(
                    username = %admin.username,
                    file = %config.password_file.display(),
                    "Created default administrator with a generated password; change it with `ranking-cli admin set-password`"
                );
            }
            Ok(true)
        }
        // Another instance seeded it first.
        Err(RepositoryError::Conflict(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}
