//! Login and logout handlers for both roles.
//!
//! Each login accepts a JSON body or an HTML form. JSON callers get
//! `{success, message, redirect}`; browsers get a redirect on success and the
//! login page with an error otherwise.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::Submission;
use crate::filters;
use crate::middleware::{IdentitySession, OptionalAdministrator, OptionalAmbassador};
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Ambassador login form data.
#[derive(Debug, Default, Deserialize)]
pub struct AmbassadorLoginForm {
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub password: String,
}

/// Administrator login form data.
#[derive(Debug, Default, Deserialize)]
pub struct AdministratorLoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Ambassador login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub cpf: String,
}

/// Administrator login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub error: Option<String>,
    pub username: String,
}

fn login_success(is_json: bool, redirect: &'static str) -> Response {
    if is_json {
        Json(json!({
            "success": true,
            "message": "Login realizado com sucesso!",
            "redirect": redirect,
        }))
        .into_response()
    } else {
        Redirect::to(redirect).into_response()
    }
}

// =============================================================================
// Ambassador
// =============================================================================

/// Display the ambassador login page.
pub async fn login_page(OptionalAmbassador(ambassador): OptionalAmbassador) -> Response {
    if ambassador.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    LoginTemplate {
        error: None,
        cpf: String::new(),
    }
    .into_response()
}

/// Handle an ambassador login.
pub async fn login(
    State(state): State<AppState>,
    identity: IdentitySession,
    Submission { data, is_json }: Submission<AmbassadorLoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .authenticate_ambassador(&data.cpf, &data.password)
        .await
    {
        Ok(ambassador) => {
            identity.login_ambassador(ambassador.id).await?;
            set_sentry_user(&ambassador.id, None);
            Ok(login_success(is_json, "/dashboard"))
        }
        Err(e) => {
            let err = AppError::from(e);
            if is_json || err.status().is_server_error() {
                return Err(err);
            }
            tracing::warn!(error = %err, "Ambassador login failed");
            let page = LoginTemplate {
                error: Some(err.public_message()),
                cpf: data.cpf,
            };
            Ok((err.status(), page).into_response())
        }
    }
}

/// Log the ambassador out. An administrator on the same session stays in.
pub async fn logout(identity: IdentitySession) -> Result<Redirect> {
    identity.logout_ambassador().await?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}

// =============================================================================
// Administrator
// =============================================================================

/// Display the administrator login page.
pub async fn admin_login_page(
    OptionalAdministrator(administrator): OptionalAdministrator,
) -> Response {
    if administrator.is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }
    AdminLoginTemplate {
        error: None,
        username: String::new(),
    }
    .into_response()
}

/// Handle an administrator login.
pub async fn admin_login(
    State(state): State<AppState>,
    identity: IdentitySession,
    Submission { data, is_json }: Submission<AdministratorLoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .authenticate_administrator(&data.username, &data.password)
        .await
    {
        Ok(administrator) => {
            identity.login_administrator(administrator.id).await?;
            set_sentry_user(&administrator.id, Some(&administrator.username));
            Ok(login_success(is_json, "/admin/dashboard"))
        }
        Err(e) => {
            let err = AppError::from(e);
            if is_json || err.status().is_server_error() {
                return Err(err);
            }
            tracing::warn!(error = %err, "Administrator login failed");
            let page = AdminLoginTemplate {
                error: Some(err.public_message()),
                username: data.username,
            };
            Ok((err.status(), page).into_response())
        }
    }
}

/// Log the administrator out. An ambassador on the same session stays in.
pub async fn admin_logout(identity: IdentitySession) -> Result<Redirect> {
    identity.logout_administrator().await?;
    clear_sentry_user();
    Ok(Redirect::to("/admin/login"))
}
