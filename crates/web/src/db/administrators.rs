//! Administrator repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use ranking_core::{AdministratorId, Email};

use super::{RepositoryError, map_unique_violation};
use crate::models::Administrator;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for administrator queries.
#[derive(Debug, sqlx::FromRow)]
struct AdministratorRow {
    id: i64,
    username: String,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdministratorRow> for Administrator {
    type Error = RepositoryError;

    fn try_from(row: AdministratorRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdministratorId::new(row.id),
            username: row.username,
            email,
            name: row.name,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    administrator: AdministratorRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for administrator database operations.
pub struct AdministratorRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdministratorRepository<'a> {
    /// Create a new administrator repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an administrator by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(
        &self,
        id: AdministratorId,
    ) -> Result<Option<Administrator>, RepositoryError> {
        let row = sqlx::query_as::<_, AdministratorRow>(
            r"
            SELECT id, username, email, name, created_at
            FROM administrator
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Returns `true` if an administrator with this username exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM administrator WHERE username = ?1)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Get an administrator and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(Administrator, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, username, email, name, created_at, password_hash
            FROM administrator
            WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let administrator = row.administrator.try_into()?;
        Ok(Some((administrator, row.password_hash)))
    }

    /// Create a new administrator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<Administrator, RepositoryError> {
        let row = sqlx::query_as::<_, AdministratorRow>(
            r"
            INSERT INTO administrator (username, email, name, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, username, email, name, created_at
            ",
        )
        .bind(username)
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "administrator"))?;

        row.try_into()
    }

    /// Replace an administrator's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no administrator has this username.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE administrator SET password_hash = ?1 WHERE username = ?2")
            .bind(password_hash)
            .bind(username)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = connect_in_memory().await.unwrap();
        let repo = AdministratorRepository::new(&pool);

        let created = repo
            .create("admin", &email("admin@example.com"), "Administrator", "h1")
            .await
            .unwrap();
        assert!(repo.username_exists("admin").await.unwrap());
        assert!(!repo.username_exists("root").await.unwrap());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "admin");
        assert_eq!(fetched.email.as_str(), "admin@example.com");

        let (admin, hash) = repo.get_credentials("admin").await.unwrap().unwrap();
        assert_eq!(admin.id, created.id);
        assert_eq!(hash, "h1");
        assert!(repo.get_credentials("root").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let pool = connect_in_memory().await.unwrap();
        let repo = AdministratorRepository::new(&pool);
        repo.create("admin", &email("a@example.com"), "A", "h")
            .await
            .unwrap();

        let err = repo
            .create("admin", &email("b@example.com"), "B", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_password() {
        let pool = connect_in_memory().await.unwrap();
        let repo = AdministratorRepository::new(&pool);
        repo.create("admin", &email("a@example.com"), "A", "old")
            .await
            .unwrap();

        repo.update_password("admin", "new").await.unwrap();
        let (_, hash) = repo.get_credentials("admin").await.unwrap().unwrap();
        assert_eq!(hash, "new");

        assert!(matches!(
            repo.update_password("nobody", "x").await,
            Err(RepositoryError::NotFound)
        ));
    }
}
