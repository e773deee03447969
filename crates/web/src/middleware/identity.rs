//! Dual-slot identity manager on top of the request session.
//!
//! Wraps a [`Session`] and exposes login, logout and lookup per role. The
//! ambassador and administrator slots are independent: logging out of one
//! never touches the other.

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::SqlitePool;
use tower_sessions::{Expiry, Session};

use ranking_core::{AdministratorId, AmbassadorId};

use super::session::SESSION_INACTIVITY;
use crate::db::{AdministratorRepository, AmbassadorRepository};
use crate::error::AppError;
use crate::models::session::keys;
use crate::models::{Administrator, Ambassador, IdentityKind, SessionIdentities};

/// The identities held by the current session.
#[derive(Clone)]
pub struct IdentitySession {
    session: Session,
}

impl<S> FromRequestParts<S> for IdentitySession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
    }
}

impl IdentitySession {
    /// Wrap a session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Read both slots. A session without identities yields empty slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn identities(&self) -> Result<SessionIdentities, AppError> {
        Ok(self
            .session
            .get::<SessionIdentities>(keys::IDENTITIES)
            .await?
            .unwrap_or_default())
    }

    async fn store(&self, identities: &SessionIdentities) -> Result<(), AppError> {
        if identities.is_empty() {
            self.session.flush().await?;
        } else {
            self.session.insert(keys::IDENTITIES, identities).await?;
        }
        Ok(())
    }

    /// Begin a login: rotate the session ID and restart the inactivity window.
    async fn begin_login(&self) -> Result<SessionIdentities, AppError> {
        let identities = self.identities().await?;
        self.session.cycle_id().await?;
        self.session
            .set_expiry(Some(Expiry::OnInactivity(SESSION_INACTIVITY)));
        Ok(identities)
    }

    /// Fill the ambassador slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn login_ambassador(&self, id: AmbassadorId) -> Result<(), AppError> {
        let mut identities = self.begin_login().await?;
        identities.sign_in_ambassador(id);
        self.store(&identities).await?;
        tracing::info!(ambassador_id = %id, "Ambassador logged in");
        Ok(())
    }

    /// Fill the administrator slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn login_administrator(&self, id: AdministratorId) -> Result<(), AppError> {
        let mut identities = self.begin_login().await?;
        identities.sign_in_administrator(id);
        self.store(&identities).await?;
        tracing::info!(administrator_id = %id, "Administrator logged in");
        Ok(())
    }

    /// Clear one slot, leaving the other as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout(&self, kind: IdentityKind) -> Result<(), AppError> {
        let mut identities = self.identities().await?;
        identities.sign_out(kind);
        self.store(&identities).await
    }

    /// Clear the ambassador slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout_ambassador(&self) -> Result<(), AppError> {
        self.logout(IdentityKind::Ambassador).await
    }

    /// Clear the administrator slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout_administrator(&self) -> Result<(), AppError> {
        self.logout(IdentityKind::Administrator).await
    }

    /// Clear both slots and destroy the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn logout_all(&self) -> Result<(), AppError> {
        self.session.flush().await?;
        Ok(())
    }

    /// The signed-in ambassador, if the slot is filled and the record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the database fails.
    pub async fn current_ambassador(&self, pool: &SqlitePool) -> Result<Option<Ambassador>, AppError> {
        let Some(id) = self.identities().await?.ambassador else {
            return Ok(None);
        };
        let ambassador = AmbassadorRepository::new(pool).get_by_id(id).await?;
        if ambassador.is_none() {
            tracing::debug!(ambassador_id = %id, "Session refers to a deleted ambassador");
        }
        Ok(ambassador)
    }

    /// The signed-in administrator, if the slot is filled and the record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store or the database fails.
    pub async fn current_administrator(
        &self,
        pool: &SqlitePool,
    ) -> Result<Option<Administrator>, AppError> {
        let Some(id) = self.identities().await?.administrator else {
            return Ok(None);
        };
        let administrator = AdministratorRepository::new(pool).get_by_id(id).await?;
        if administrator.is_none() {
            tracing::debug!(administrator_id = %id, "Session refers to a deleted administrator");
        }
        Ok(administrator)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ranking_core::{Coupon, DEFAULT_GOAL, Email, NationalId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::NewAmbassador;

    fn identity() -> IdentitySession {
        let store = Arc::new(MemoryStore::default());
        IdentitySession::new(Session::new(None, store, None))
    }

    async fn seeded_pool() -> (SqlitePool, AmbassadorId, AdministratorId) {
        let pool = connect_in_memory().await.unwrap();
        let ambassador = AmbassadorRepository::new(&pool)
            .create(&NewAmbassador {
                name: "Maria".to_owned(),
                national_id: NationalId::parse("52998224725").unwrap(),
                password_hash: "h".to_owned(),
                coupon: Coupon::from_stored("ODONTOMARIA10".to_owned()),
                goal: DEFAULT_GOAL,
            })
            .await
            .unwrap();
        let administrator = AdministratorRepository::new(&pool)
            .create("admin", &Email::parse("a@example.com").unwrap(), "Admin", "h")
            .await
            .unwrap();
        (pool, ambassador.id, administrator.id)
    }

    #[tokio::test]
    async fn test_both_roles_coexist_and_log_out_independently() {
        let (pool, ambassador_id, administrator_id) = seeded_pool().await;
        let identity = identity();

        identity.login_ambassador(ambassador_id).await.unwrap();
        identity.login_administrator(administrator_id).await.unwrap();
        assert!(identity.current_ambassador(&pool).await.unwrap().is_some());
        assert!(identity.current_administrator(&pool).await.unwrap().is_some());

        identity.logout_ambassador().await.unwrap();
        assert!(identity.current_ambassador(&pool).await.unwrap().is_none());
        let admin = identity.current_administrator(&pool).await.unwrap().unwrap();
        assert_eq!(admin.id, administrator_id);
    }

    #[tokio::test]
    async fn test_admin_logout_keeps_ambassador() {
        let (pool, ambassador_id, administrator_id) = seeded_pool().await;
        let identity = identity();

        identity.login_administrator(administrator_id).await.unwrap();
        identity.login_ambassador(ambassador_id).await.unwrap();
        identity.logout_administrator().await.unwrap();

        assert!(identity.current_administrator(&pool).await.unwrap().is_none());
        assert!(identity.current_ambassador(&pool).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_all_clears_both() {
        let (pool, ambassador_id, administrator_id) = seeded_pool().await;
        let identity = identity();

        identity.login_ambassador(ambassador_id).await.unwrap();
        identity.login_administrator(administrator_id).await.unwrap();
        identity.logout_all().await.unwrap();

        assert!(identity.identities().await.unwrap().is_empty());
        assert!(identity.current_ambassador(&pool).await.unwrap().is_none());
        assert!(identity.current_administrator(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dangling_reference_resolves_to_none() {
        let (pool, _, _) = seeded_pool().await;
        let identity = identity();

        identity.login_ambassador(AmbassadorId::new(999)).await.unwrap();
        identity.login_administrator(AdministratorId::new(999)).await.unwrap();
        assert!(identity.current_ambassador(&pool).await.unwrap().is_none());
        assert!(identity.current_administrator(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_session_has_no_identities() {
        let (pool, _, _) = seeded_pool().await;
        let identity = identity();
        assert!(identity.current_ambassador(&pool).await.unwrap().is_none());
        identity.logout_ambassador().await.unwrap();
        assert!(identity.identities().await.unwrap().is_empty());
    }
}
