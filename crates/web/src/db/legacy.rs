//! Upgrade from the legacy single-table schema.
//!
//! Older deployments kept ambassadors in a table named `user`, first keyed by
//! email and later by CPF. On startup, rows that carry a real CPF are copied
//! into `ambassador` with their id. Rows without a CPF or with the
//! placeholder CPF are dropped along with the table.
//!
//! Any other row that cannot be copied (bad check digits, unreadable totals,
//! a duplicate, or every row of an email-era table) is kept: the legacy table
//! is renamed to `user_legacy` instead of dropped so an administrator can
//! recover those ambassadors by hand.
//!
//! Legacy password hashes are copied as-is. They are not argon2 PHC strings,
//! so those ambassadors need a new password from an administrator.

use chrono::Utc;
use sqlx::SqlitePool;

use ranking_core::NationalId;

use super::{RepositoryError, parse_decimal};

/// Name the legacy table is kept under when some rows could not be copied.
pub const PRESERVED_TABLE: &str = "user_legacy";

/// What [`upgrade`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyReport {
    /// A legacy `user` table was present (and is now gone or renamed).
    pub found_legacy_table: bool,
    /// Rows copied into `ambassador`.
    pub copied: u64,
    /// Rows without a CPF or with the placeholder CPF.
    pub skipped: u64,
    /// Rows that could not be copied and were kept for manual recovery.
    pub unrecoverable: u64,
    /// Table the legacy rows were renamed to, if any were kept.
    pub preserved_as: Option<String>,
}

enum LegacyCpf {
    /// Null, blank or the placeholder.
    Missing,
    Invalid,
    Valid(NationalId),
}

#[derive(Debug, sqlx::FromRow)]
struct LegacyUserRow {
    id: i64,
    name: String,
    cpf: Option<String>,
    password: String,
    coupon: String,
    total_sales: String,
    total_lists: i64,
    goal: String,
}

/// Copy a legacy `user` table into `ambassador`, then drop it or, when rows
/// were left behind, rename it to [`PRESERVED_TABLE`].
///
/// Runs in one transaction. Without a legacy table this is a no-op.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any statement fails; nothing is
/// changed in that case.
pub async fn upgrade(pool: &SqlitePool) -> Result<LegacyReport, RepositoryError> {
    let mut tx = pool.begin().await?;

    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'user')",
    )
    .fetch_one(&mut *tx)
    .await?;
    if !has_table {
        return Ok(LegacyReport::default());
    }

    let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('user')")
        .fetch_all(&mut *tx)
        .await?;

    let mut report = LegacyReport {
        found_legacy_table: true,
        ..LegacyReport::default()
    };

    if columns.iter().any(|c| c == "cpf") {
        let rows = sqlx::query_as::<_, LegacyUserRow>(
            r#"
            SELECT id,
                   COALESCE(name, '') AS name,
                   cpf,
                   COALESCE(password, '') AS password,
                   COALESCE(coupon, '') AS coupon,
                   CAST(COALESCE(total_sales, 0) AS TEXT) AS total_sales,
                   COALESCE(total_lists, 0) AS total_lists,
                   CAST(COALESCE(goal, 50000) AS TEXT) AS goal
            FROM "user"
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        for row in rows {
            let national_id = match legacy_national_id(row.cpf.as_deref()) {
                LegacyCpf::Valid(national_id) => national_id,
                LegacyCpf::Missing => {
                    tracing::info!(legacy_id = row.id, "Skipping legacy user without a CPF");
                    report.skipped += 1;
                    continue;
                }
                LegacyCpf::Invalid => {
                    tracing::warn!(legacy_id = row.id, "Keeping legacy user with an invalid CPF");
                    report.unrecoverable += 1;
                    continue;
                }
            };
            let (Ok(total_sales), Ok(goal)) = (
                parse_decimal(&row.total_sales, "total_sales"),
                parse_decimal(&row.goal, "goal"),
            ) else {
                tracing::warn!(legacy_id = row.id, "Keeping legacy user with unreadable totals");
                report.unrecoverable += 1;
                continue;
            };
            if row.coupon.is_empty() || row.total_lists < 0 {
                tracing::warn!(legacy_id = row.id, "Keeping legacy user with invalid data");
                report.unrecoverable += 1;
                continue;
            }

            let result = sqlx::query(
                r"
                INSERT OR IGNORE INTO ambassador
                    (id, name, national_id, password_hash, coupon, total_sales, total_lists, goal, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )
            .bind(row.id)
            .bind(&row.name)
            .bind(national_id.as_str())
            .bind(&row.password)
            .bind(&row.coupon)
            .bind(total_sales.max(rust_decimal::Decimal::ZERO).to_string())
            .bind(row.total_lists)
            .bind(goal.to_string())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!(legacy_id = row.id, "Keeping duplicate legacy user");
                report.unrecoverable += 1;
            } else {
                report.copied += 1;
            }
        }
    } else {
        let rows: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user""#)
            .fetch_one(&mut *tx)
            .await?;
        report.unrecoverable = u64::try_from(rows).unwrap_or(0);
        tracing::warn!(rows, "Legacy user table has no CPF column; ambassadors must be recreated");
    }

    if report.unrecoverable == 0 {
        sqlx::query(r#"DROP TABLE "user""#).execute(&mut *tx).await?;
    } else {
        let target = free_table_name(&mut tx).await?;
        let rename = format!(r#"ALTER TABLE "user" RENAME TO "{target}""#);
        sqlx::query(&rename).execute(&mut *tx).await?;
        tracing::warn!(
            rows = report.unrecoverable,
            table = %target,
            "Legacy users that could not be migrated were kept"
        );
        report.preserved_as = Some(target);
    }
    tx.commit().await?;

    Ok(report)
}

/// `user_legacy`, or `user_legacy_2`, `user_legacy_3`... if taken.
async fn free_table_name(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
) -> Result<String, RepositoryError> {
    let mut suffix = 1_u32;
    loop {
        let name = if suffix == 1 {
            PRESERVED_TABLE.to_owned()
        } else {
            format!("{PRESERVED_TABLE}_{suffix}")
        };
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        )
        .bind(&name)
        .fetch_one(&mut **tx)
        .await?;
        if !taken {
            return Ok(name);
        }
        suffix += 1;
    }
}

fn legacy_national_id(cpf: Option<&str>) -> LegacyCpf {
    let Some(cpf) = cpf.map(str::trim).filter(|c| !c.is_empty()) else {
        return LegacyCpf::Missing;
    };
    if cpf == NationalId::LEGACY_PLACEHOLDER {
        return LegacyCpf::Missing;
    }
    NationalId::parse(cpf).map_or(LegacyCpf::Invalid, LegacyCpf::Valid)
}
