//! Authentication error types.

use thiserror::Error;

use ranking_core::NationalIdError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required login field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The CPF does not validate.
    #[error("invalid CPF: {0}")]
    InvalidNationalId(#[from] NationalIdError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Unknown administrator username or wrong password.
    #[error("invalid administrator credentials")]
    InvalidAdministratorCredentials,

    /// No administrator has the given username.
    #[error("administrator not found")]
    AdministratorNotFound,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
