//! Administrator dashboard and ambassador CRUD API.
//!
//! The API speaks JSON with snake_case fields. Mutations answer
//! `{success, message, user?}`; failures use the shared error body.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use ranking_core::AmbassadorId;
use ranking_core::progress::{format_brl, format_percent};

use crate::db::AmbassadorRepository;
use crate::error::{AppError, Result};
use crate::extract::Submission;
use crate::filters;
use crate::middleware::RequireAdministrator;
use crate::models::Ambassador;
use crate::services::roster::{AmbassadorChanges, NewAmbassadorRequest, RosterService};
use crate::state::AppState;

// =============================================================================
// JSON Types
// =============================================================================

/// Ambassador as returned by the administrator API.
#[derive(Debug, Serialize)]
pub struct AmbassadorRecord {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub coupon: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
    pub total_lists: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub goal: Decimal,
}

impl From<Ambassador> for AmbassadorRecord {
    fn from(a: Ambassador) -> Self {
        Self {
            id: a.id.as_i64(),
            name: a.name,
            cpf: a.national_id.into_inner(),
            coupon: a.coupon.into_inner(),
            total_sales: a.total_sales,
            total_lists: a.total_lists,
            goal: a.goal,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// One row of the administrator's ambassador table.
pub struct AmbassadorTableRow {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub coupon: String,
    pub total_sales: String,
    /// Plain decimal for the edit form.
    pub total_sales_raw: String,
    pub total_lists: i64,
    pub goal: String,
    pub goal_raw: String,
    pub percent: String,
}

impl From<&Ambassador> for AmbassadorTableRow {
    fn from(a: &Ambassador) -> Self {
        Self {
            id: a.id.as_i64(),
            name: a.name.clone(),
            cpf: a.national_id.to_string(),
            coupon: a.coupon.to_string(),
            total_sales: format_brl(a.total_sales),
            total_sales_raw: a.total_sales.normalize().to_string(),
            total_lists: a.total_lists,
            goal: format_brl(a.goal),
            goal_raw: a.goal.normalize().to_string(),
            percent: format_percent(a.progress().percent),
        }
    }
}

/// Administrator dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub administrator_name: String,
    pub ambassador_count: i64,
    pub total_sales: String,
    pub total_lists: i64,
    pub ambassadors: Vec<AmbassadorTableRow>,
}

// =============================================================================
// Pages
// =============================================================================

/// `/admin` always goes to the login page, which forwards signed-in
/// administrators to the dashboard.
pub async fn admin_home() -> Redirect {
    Redirect::to("/admin/login")
}

/// Display statistics and every ambassador, newest first.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdministrator(administrator): RequireAdministrator,
) -> Result<AdminDashboardTemplate> {
    let repo = AmbassadorRepository::new(state.pool());
    let stats = repo.stats().await?;
    let ambassadors = repo.list_newest_first().await?;

    Ok(AdminDashboardTemplate {
        administrator_name: administrator.name,
        ambassador_count: stats.ambassadors,
        total_sales: format_brl(stats.total_sales),
        total_lists: stats.total_lists,
        ambassadors: ambassadors.iter().map(AmbassadorTableRow::from).collect(),
    })
}

// =============================================================================
// API
// =============================================================================

/// List every ambassador, newest first.
pub async fn list_ambassadors(
    State(state): State<AppState>,
    _administrator: RequireAdministrator,
) -> Result<Json<Vec<AmbassadorRecord>>> {
    let ambassadors = AmbassadorRepository::new(state.pool())
        .list_newest_first()
        .await?;
    Ok(Json(ambassadors.into_iter().map(Into::into).collect()))
}

/// Create an ambassador from `{name, cpf, password}`.
pub async fn create_ambassador(
    State(state): State<AppState>,
    _administrator: RequireAdministrator,
    Submission { data, .. }: Submission<NewAmbassadorRequest>,
) -> Result<Response> {
    let ambassador = RosterService::new(state.pool()).create(&data).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Usuário cadastrado com sucesso!",
            "user": AmbassadorRecord::from(ambassador),
        })),
    )
        .into_response())
}

/// Fetch one ambassador.
pub async fn get_ambassador(
    State(state): State<AppState>,
    _administrator: RequireAdministrator,
    Path(id): Path<i64>,
) -> Result<Json<AmbassadorRecord>> {
    let ambassador = AmbassadorRepository::new(state.pool())
        .get_by_id(AmbassadorId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Embaixador".to_string()))?;
    Ok(Json(ambassador.into()))
}

/// Update any of `{total_sales, total_lists, goal}`.
pub async fn update_ambassador(
    State(state): State<AppState>,
    _administrator: RequireAdministrator,
    Path(id): Path<i64>,
    Submission { data, .. }: Submission<AmbassadorChanges>,
) -> Result<Json<serde_json::Value>> {
    let ambassador = RosterService::new(state.pool())
        .update(AmbassadorId::new(id), data)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Dados atualizados com sucesso!",
        "user": AmbassadorRecord::from(ambassador),
    })))
}

/// Delete an ambassador.
pub async fn delete_ambassador(
    State(state): State<AppState>,
    _administrator: RequireAdministrator,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    RosterService::new(state.pool())
        .delete(AmbassadorId::new(id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Usuário excluído com sucesso!",
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use chrono::Utc;
    use ranking_core::{Coupon, NationalId};

    use super::*;

    fn ambassador() -> Ambassador {
        Ambassador {
            id: AmbassadorId::new(3),
            name: "Bia".to_owned(),
            national_id: NationalId::parse("11144477735").unwrap(),
            coupon: Coupon::from_stored("ODONTOBIA55".to_owned()),
            total_sales: Decimal::from_str("2500.50").unwrap(),
            total_lists: 2,
            goal: Decimal::from(10_000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_json_is_snake_case() {
        let value = serde_json::to_value(AmbassadorRecord::from(ambassador())).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["cpf"], "111.444.777-35");
        assert_eq!(value["coupon"], "ODONTOBIA55");
        assert_eq!(value["total_sales"], 2500.5);
        assert_eq!(value["total_lists"], 2);
        assert_eq!(value["goal"], 10000.0);
    }

    #[test]
    fn test_table_row() {
        let row = AmbassadorTableRow::from(&ambassador());
        assert_eq!(row.total_sales, "2.500,50");
        assert_eq!(row.total_sales_raw, "2500.5");
        assert_eq!(row.goal_raw, "10000");
        assert_eq!(row.percent, "25,0%");
    }
}
