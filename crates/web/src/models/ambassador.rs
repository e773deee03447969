//! Ambassador domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use ranking_core::{AmbassadorId, Coupon, GoalProgress, NationalId};

/// A salesperson taking part in the ranking.
///
/// National ID and coupon are fixed at creation. Totals and goal only change
/// through an administrator's [`AmbassadorUpdate`].
#[derive(Debug, Clone)]
pub struct Ambassador {
    pub id: AmbassadorId,
    pub name: String,
    pub national_id: NationalId,
    pub coupon: Coupon,
    pub total_sales: Decimal,
    pub total_lists: i64,
    pub goal: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Ambassador {
    /// Progress towards the sales goal.
    #[must_use]
    pub fn progress(&self) -> GoalProgress {
        GoalProgress::new(self.total_sales, self.goal)
    }
}

/// Everything needed to insert an ambassador.
#[derive(Debug, Clone)]
pub struct NewAmbassador {
    pub name: String,
    pub national_id: NationalId,
    pub password_hash: String,
    pub coupon: Coupon,
    pub goal: Decimal,
}

/// Administrator edit of an ambassador's numbers. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbassadorUpdate {
    pub total_sales: Option<Decimal>,
    pub total_lists: Option<i64>,
    pub goal: Option<Decimal>,
}
