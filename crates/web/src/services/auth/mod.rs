//! Authentication service.
//!
//! Ambassadors sign in with CPF and password, administrators with username
//! and password. Passwords are stored as argon2 PHC strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use ranking_core::NationalId;

use crate::db::{AdministratorRepository, AmbassadorRepository, RepositoryError};
use crate::models::{Administrator, Ambassador};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
pub struct AuthService<'a> {
    ambassadors: AmbassadorRepository<'a>,
    administrators: AdministratorRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            ambassadors: AmbassadorRepository::new(pool),
            administrators: AdministratorRepository::new(pool),
        }
    }

    /// Check an ambassador's CPF and password.
    ///
    /// The CPF may be typed with or without punctuation.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if the CPF is blank.
    /// Returns `AuthError::InvalidNationalId` if the CPF does not validate.
    /// Returns `AuthError::InvalidCredentials` if no ambassador has this CPF
    /// or the password is wrong.
    pub async fn authenticate_ambassador(
        &self,
        cpf: &str,
        password: &str,
    ) -> Result<Ambassador, AuthError> {
        if cpf.trim().is_empty() {
            return Err(AuthError::MissingField("CPF"));
        }
        let national_id = NationalId::parse(cpf)?;

        let (ambassador, password_hash) = self
            .ambassadors
            .get_credentials(&national_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(ambassador)
    }

    /// Check an administrator's username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAdministratorCredentials` if the username is
    /// unknown or the password is wrong.
    pub async fn authenticate_administrator(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Administrator, AuthError> {
        let (administrator, password_hash) = self
            .administrators
            .get_credentials(username.trim())
            .await?
            .ok_or(AuthError::InvalidAdministratorCredentials)?;

        verify_password(password, &password_hash).map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::InvalidAdministratorCredentials,
            other => other,
        })?;

        Ok(administrator)
    }

    /// Replace an administrator's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::AdministratorNotFound` if the username is unknown.
    pub async fn change_administrator_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        self.administrators
            .update_password(username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::AdministratorNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Check the password length policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password with argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC string.
///
/// A hash that cannot be parsed (for example one carried over from the
/// legacy schema) never verifies.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
