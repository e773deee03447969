//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. Every error body is JSON of the form
//! `{"success": false, "message": "..."}`, with the message in Portuguese.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ranking_core::CouponError;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::roster::RosterError;

/// Application-level error type for the ranking server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Ambassador management failed.
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::MissingField(_)
                | AuthError::InvalidNationalId(_)
                | AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials | AuthError::InvalidAdministratorCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AdministratorNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(err) => repository_status(err),
                AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Roster(err) => match err {
                RosterError::MissingFields
                | RosterError::PasswordTooShort
                | RosterError::InvalidNationalId(_)
                | RosterError::InvalidValue(_) => StatusCode::BAD_REQUEST,
                RosterError::DuplicateNationalId => StatusCode::CONFLICT,
                RosterError::NotFound => StatusCode::NOT_FOUND,
                RosterError::Repository(err) => repository_status(err),
                RosterError::Coupon(_) | RosterError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(err)
            | Self::Auth(AuthError::Repository(err))
            | Self::Roster(RosterError::Repository(err)) => match err {
                RepositoryError::NotFound => "Registro não encontrado!".to_string(),
                RepositoryError::Conflict(msg) if msg.starts_with("national ID") => {
                    DUPLICATE_CPF.to_string()
                }
                RepositoryError::Conflict(_) => "Este registro já existe!".to_string(),
                _ => INTERNAL_ERROR.to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::MissingField(field) => format!("{field} é obrigatório!"),
                AuthError::InvalidNationalId(_) => INVALID_CPF.to_string(),
                AuthError::InvalidCredentials => "CPF ou senha incorretos!".to_string(),
                AuthError::InvalidAdministratorCredentials => {
                    "Usuário ou senha incorretos!".to_string()
                }
                AuthError::AdministratorNotFound => "Administrador não encontrado!".to_string(),
                AuthError::WeakPassword(_) => PASSWORD_TOO_SHORT.to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => INTERNAL_ERROR.to_string(),
            },
            Self::Roster(err) => match err {
                RosterError::MissingFields => "Todos os campos são obrigatórios!".to_string(),
                RosterError::PasswordTooShort => PASSWORD_TOO_SHORT.to_string(),
                RosterError::InvalidNationalId(_) => INVALID_CPF.to_string(),
                RosterError::DuplicateNationalId => DUPLICATE_CPF.to_string(),
                RosterError::InvalidValue(msg) => (*msg).to_string(),
                RosterError::NotFound => "Embaixador não encontrado!".to_string(),
                RosterError::Coupon(CouponError::Exhausted { prefix }) => {
                    format!("Não há cupons disponíveis para {prefix}!")
                }
                RosterError::PasswordHash | RosterError::Repository(_) => {
                    INTERNAL_ERROR.to_string()
                }
            },
            Self::Session(_) | Self::Internal(_) => INTERNAL_ERROR.to_string(),
            Self::NotFound(what) => format!("{what} não encontrado!"),
            Self::BadRequest(_) => "Dados inválidos ou não fornecidos!".to_string(),
        }
    }
}

const INTERNAL_ERROR: &str = "Erro interno do servidor!";
const INVALID_CPF: &str = "CPF inválido!";
const DUPLICATE_CPF: &str = "Este CPF já está cadastrado!";
const PASSWORD_TOO_SHORT: &str = "A senha deve ter pelo menos 6 caracteres!";

const fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = json!({
            "success": false,
            "message": self.public_message(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after a login.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Embaixador".to_string());
        assert_eq!(err.to_string(), "Not found: Embaixador");
        assert_eq!(err.public_message(), "Embaixador não encontrado!");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_validation_and_conflict_are_distinct() {
        assert_eq!(
            get_status(RosterError::MissingFields.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RosterError::InvalidValue("A meta deve ser maior que zero!").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RosterError::DuplicateNationalId.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("coupon already exists".into()).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_coupon_exhaustion_is_server_error() {
        let err = AppError::from(RosterError::Coupon(CouponError::Exhausted {
            prefix: "ODONTOANA".to_string(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.public_message().contains("ODONTOANA"));
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 7".into()));
        assert_eq!(err.public_message(), "Erro interno do servidor!");
        let err = AppError::Internal("secret detail".into());
        assert_eq!(err.public_message(), "Erro interno do servidor!");
    }

    #[test]
    fn test_public_messages() {
        assert_eq!(
            AppError::from(RosterError::DuplicateNationalId).public_message(),
            "Este CPF já está cadastrado!"
        );
        assert_eq!(
            AppError::from(AuthError::MissingField("CPF")).public_message(),
            "CPF é obrigatório!"
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).public_message(),
            "CPF ou senha incorretos!"
        );
        assert_eq!(
            AppError::from(AuthError::InvalidAdministratorCredentials).public_message(),
            "Usuário ou senha incorretos!"
        );
        assert_eq!(
            AppError::from(RosterError::PasswordTooShort).public_message(),
            "A senha deve ter pelo menos 6 caracteres!"
        );
        assert_eq!(
            AppError::from(RosterError::InvalidValue("A meta é grande demais!")).public_message(),
            "A meta é grande demais!"
        );
        assert_eq!(
            AppError::from(RepositoryError::Conflict("national ID already exists".into()))
                .public_message(),
            "Este CPF já está cadastrado!"
        );
    }
}
