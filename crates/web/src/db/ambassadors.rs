//! Ambassador repository for database operations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use ranking_core::{AmbassadorId, Coupon, NationalId};

use super::{RepositoryError, parse_decimal};
use crate::models::{Ambassador, AmbassadorUpdate, NewAmbassador};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for ambassador queries.
#[derive(Debug, sqlx::FromRow)]
struct AmbassadorRow {
    id: i64,
    name: String,
    national_id: String,
    coupon: String,
    total_sales: String,
    total_lists: i64,
    goal: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AmbassadorRow> for Ambassador {
    type Error = RepositoryError;

    fn try_from(row: AmbassadorRow) -> Result<Self, Self::Error> {
        let national_id = NationalId::parse(&row.national_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid national ID in database: {e}"))
        })?;

        Ok(Self {
            id: AmbassadorId::new(row.id),
            name: row.name,
            national_id,
            coupon: Coupon::from_stored(row.coupon),
            total_sales: parse_decimal(&row.total_sales, "total_sales")?,
            total_lists: row.total_lists,
            goal: parse_decimal(&row.goal, "goal")?,
            created_at: row.created_at,
        })
    }
}

/// Ambassador row plus the password hash, for login only.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    ambassador: AmbassadorRow,
    password_hash: String,
}

/// Aggregate numbers for the administrator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterStats {
    pub ambassadors: i64,
    pub total_sales: Decimal,
    pub total_lists: i64,
}

/// Entry of the public leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub total_sales: Decimal,
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let what = if db_err.message().contains("coupon") {
            "coupon"
        } else {
            "national ID"
        };
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for ambassador database operations.
pub struct AmbassadorRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AmbassadorRepository<'a> {
    /// Create a new ambassador repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all ambassadors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row is invalid.
    pub async fn list_newest_first(&self) -> Result<Vec<Ambassador>, RepositoryError> {
        let rows = sqlx::query_as::<_, AmbassadorRow>(
            r"
            SELECT id, name, national_id, coupon, total_sales, total_lists, goal, created_at
            FROM ambassador
            ORDER BY id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an ambassador by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_by_id(&self, id: AmbassadorId) -> Result<Option<Ambassador>, RepositoryError> {
        let row = sqlx::query_as::<_, AmbassadorRow>(
            r"
            SELECT id, name, national_id, coupon, total_sales, total_lists, goal, created_at
            FROM ambassador
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Returns `true` if an ambassador with this national ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn national_id_exists(&self, national_id: &NationalId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ambassador WHERE national_id = ?1)")
                .bind(national_id.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Get an ambassador and their password hash by national ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row is invalid.
    pub async fn get_credentials(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<(Ambassador, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, name, national_id, coupon, total_sales, total_lists, goal, created_at,
                   password_hash
            FROM ambassador
            WHERE national_id = ?1
            ",
        )
        .bind(national_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let ambassador = row.ambassador.try_into()?;
        Ok(Some((ambassador, row.password_hash)))
    }

    /// Coupons already issued that start with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn coupons_with_prefix(&self, prefix: &str) -> Result<HashSet<String>, RepositoryError> {
        let coupons: Vec<String> = sqlx::query_scalar(
            "SELECT coupon FROM ambassador WHERE substr(coupon, 1, length(?1)) = ?1",
        )
        .bind(prefix)
        .fetch_all(self.pool)
        .await?;

        Ok(coupons.into_iter().collect())
    }

    /// Insert a new ambassador with zero totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the national ID or coupon is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewAmbassador) -> Result<Ambassador, RepositoryError> {
        let row = sqlx::query_as::<_, AmbassadorRow>(
            r"
            INSERT INTO ambassador (name, national_id, password_hash, coupon, total_sales, total_lists, goal, created_at)
            VALUES (?1, ?2, ?3, ?4, '0', 0, ?5, ?6)
            RETURNING id, name, national_id, coupon, total_sales, total_lists, goal, created_at
            ",
        )
        .bind(&new.name)
        .bind(new.national_id.as_str())
        .bind(&new.password_hash)
        .bind(new.coupon.as_str())
        .bind(new.goal.to_string())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        row.try_into()
    }

    /// Apply an administrator update. Fields left as `None` are unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ambassador doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: AmbassadorId,
        update: &AmbassadorUpdate,
    ) -> Result<Ambassador, RepositoryError> {
        let row = sqlx::query_as::<_, AmbassadorRow>(
            r"
            UPDATE ambassador
            SET total_sales = COALESCE(?1, total_sales),
                total_lists = COALESCE(?2, total_lists),
                goal = COALESCE(?3, goal)
            WHERE id = ?4
            RETURNING id, name, national_id, coupon, total_sales, total_lists, goal, created_at
            ",
        )
        .bind(update.total_sales.map(|d| d.to_string()))
        .bind(update.total_lists)
        .bind(update.goal.map(|d| d.to_string()))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an ambassador.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ambassador doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: AmbassadorId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM ambassador WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Highest total sales first. Ties go to the earlier ambassador.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored amount is invalid.
    pub async fn top_by_sales(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, RepositoryError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT name, total_sales
            FROM ambassador
            ORDER BY CAST(total_sales AS REAL) DESC, id ASC
            LIMIT ?1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(name, total_sales)| {
                Ok(LeaderboardEntry {
                    name,
                    total_sales: parse_decimal(&total_sales, "total_sales")?,
                })
            })
            .collect()
    }

    /// Count, total sales and total lists across all ambassadors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored amount is invalid.
    pub async fn stats(&self) -> Result<RosterStats, RepositoryError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT total_sales, total_lists FROM ambassador")
                .fetch_all(self.pool)
                .await?;

        rows.iter().try_fold(RosterStats::default(), |mut stats, (sales, lists)| {
            let overflow = || RepositoryError::DataCorruption("roster totals overflow".to_string());
            stats.ambassadors += 1;
            stats.total_sales = stats
                .total_sales
                .checked_add(parse_decimal(sales, "total_sales")?)
                .ok_or_else(overflow)?;
            stats.total_lists = stats.total_lists.checked_add(*lists).ok_or_else(overflow)?;
            Ok(stats)
        })
    }
}
