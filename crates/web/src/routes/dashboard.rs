//! Ambassador dashboard and JSON API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;

use ranking_core::progress::{MILESTONES, format_brl, format_percent};

use crate::db::AmbassadorRepository;
use crate::db::ambassadors::LeaderboardEntry;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAmbassador;
use crate::models::Ambassador;
use crate::state::AppState;

/// Entries shown on the public leaderboard.
pub const LEADERBOARD_SIZE: u32 = 3;

/// One leaderboard line. Only the name is public.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RankingEntry {
    /// Ordinal such as `1º`.
    pub position: String,
    pub name: String,
}

impl RankingEntry {
    fn ranked(entries: Vec<LeaderboardEntry>) -> Vec<Self> {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| Self {
                position: format!("{}º", i + 1),
                name: entry.name,
            })
            .collect()
    }
}

/// Profile returned by `/api/user`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbassadorProfile {
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

impl From<Ambassador> for AmbassadorProfile {
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

/// A milestone marker on the dashboard bar.
pub struct MilestoneView {
    pub label: String,
    pub reached: bool,
}

/// Ambassador dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
    pub cpf: String,
    pub coupon: String,
    pub total_sales: String,
    pub total_lists: i64,
    pub goal: String,
    pub remaining: String,
    pub goal_reached: bool,
    pub percent: String,
    /// Value for the `<progress>` element, `0..=100`.
    pub bar_value: String,
    pub milestones: Vec<MilestoneView>,
    pub ranking: Vec<RankingEntry>,
}

impl DashboardTemplate {
    fn new(ambassador: &Ambassador, ranking: Vec<RankingEntry>) -> Self {
        let progress = ambassador.progress();
        let milestones = MILESTONES
            .iter()
            .zip(progress.milestones_reached)
            .map(|(m, reached)| MilestoneView {
                label: format_brl(*m),
                reached,
            })
            .collect();

        Self {
            name: ambassador.name.clone(),
            cpf: ambassador.national_id.to_string(),
            coupon: ambassador.coupon.to_string(),
            total_sales: format_brl(ambassador.total_sales),
            total_lists: ambassador.total_lists,
            goal: format_brl(ambassador.goal),
            remaining: format_brl(progress.remaining.max(Decimal::ZERO)),
            goal_reached: progress.remaining <= Decimal::ZERO,
            percent: format_percent(progress.percent),
            bar_value: progress.bar_percent.round_dp(1).normalize().to_string(),
            milestones,
            ranking,
        }
    }
}

async fn leaderboard(state: &AppState) -> Result<Vec<RankingEntry>> {
    let top = AmbassadorRepository::new(state.pool())
        .top_by_sales(LEADERBOARD_SIZE)
        .await?;
    Ok(RankingEntry::ranked(top))
}

/// Display the ambassador's dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAmbassador(ambassador): RequireAmbassador,
) -> Result<DashboardTemplate> {
    let ranking = leaderboard(&state).await?;
    Ok(DashboardTemplate::new(&ambassador, ranking))
}

/// The signed-in ambassador's profile.
pub async fn current_user(RequireAmbassador(ambassador): RequireAmbassador) -> Json<AmbassadorProfile> {
    Json(ambassador.into())
}

/// The top three ambassadors by total sales.
pub async fn ranking_top3(
    State(state): State<AppState>,
    _ambassador: RequireAmbassador,
) -> Result<Json<Vec<RankingEntry>>> {
    Ok(Json(leaderboard(&state).await?))
}
