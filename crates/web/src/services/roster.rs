//! Administrator management of ambassadors.
//!
//! Creation validates the input, hashes the password and issues a coupon.
//! Updates only touch sales, lists and goal.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;

use ranking_core::coupon::coupon_prefix;
use ranking_core::{AmbassadorId, CouponError, DEFAULT_GOAL, NationalId, NationalIdError, generate_coupon};

use super::auth;
use crate::db::{AmbassadorRepository, RepositoryError};
use crate::models::{Ambassador, AmbassadorUpdate, NewAmbassador};

/// Times a create is retried when another request takes the drawn coupon
/// between the lookup and the insert.
const COUPON_RACE_RETRIES: usize = 3;

/// Largest accepted total sales or goal (R$ 1 trillion).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Largest accepted number of closed lists.
pub const MAX_LISTS: i64 = 1_000_000_000;

/// Errors from roster operations.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Name, CPF or password is blank.
    #[error("name, CPF and password are required")]
    MissingFields,

    /// Password shorter than [`auth::MIN_PASSWORD_LENGTH`].
    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    /// The CPF does not validate.
    #[error("invalid CPF: {0}")]
    InvalidNationalId(#[from] NationalIdError),

    /// An ambassador with this CPF already exists.
    #[error("this CPF is already registered")]
    DuplicateNationalId,

    /// An update value is out of range. Carries the message shown to the
    /// administrator.
    #[error("{0}")]
    InvalidValue(&'static str),

    /// No ambassador has the given ID.
    #[error("ambassador not found")]
    NotFound,

    /// Every coupon for this name is taken.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Input for creating an ambassador.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAmbassadorRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub password: String,
}

/// Requested changes to an ambassador. Decimals may arrive as JSON numbers
/// or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmbassadorChanges {
    pub total_sales: Option<Decimal>,
    pub total_lists: Option<Decimal>,
    pub goal: Option<Decimal>,
}

impl TryFrom<AmbassadorChanges> for AmbassadorUpdate {
    type Error = RosterError;

    fn try_from(changes: AmbassadorChanges) -> Result<Self, Self::Error> {
        if let Some(sales) = changes.total_sales {
            if sales.is_sign_negative() && !sales.is_zero() {
                return Err(RosterError::InvalidValue("O total de vendas não pode ser negativo!"));
            }
            if sales > MAX_AMOUNT {
                return Err(RosterError::InvalidValue("O total de vendas é grande demais!"));
            }
        }
        let total_lists = changes
            .total_lists
            .map(|v| {
                if v.is_sign_negative() && !v.is_zero() {
                    return Err(RosterError::InvalidValue("O total de listas não pode ser negativo!"));
                }
                if !v.fract().is_zero() {
                    return Err(RosterError::InvalidValue("O total de listas deve ser um número inteiro!"));
                }
                i64::try_from(v)
                    .ok()
                    .filter(|lists| *lists <= MAX_LISTS)
                    .ok_or(RosterError::InvalidValue("O total de listas é grande demais!"))
            })
            .transpose()?;
        if let Some(goal) = changes.goal {
            if goal <= Decimal::ZERO {
                return Err(RosterError::InvalidValue("A meta deve ser maior que zero!"));
            }
            if goal > MAX_AMOUNT {
                return Err(RosterError::InvalidValue("A meta é grande demais!"));
            }
        }

        Ok(Self {
            total_sales: changes.total_sales.map(|v| v.normalize()),
            total_lists,
            goal: changes.goal.map(|v| v.normalize()),
        })
    }
}

/// Roster service.
pub struct RosterService<'a> {
    ambassadors: AmbassadorRepository<'a>,
}

impl<'a> RosterService<'a> {
    /// Create a new roster service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            ambassadors: AmbassadorRepository::new(pool),
        }
    }

    /// Create an ambassador with zero totals, the default goal and a fresh
    /// coupon.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::MissingFields`, `PasswordTooShort` or
    /// `InvalidNationalId` for bad input, `DuplicateNationalId` if the CPF is
    /// taken, and `Coupon` if no coupon is free for the name.
    pub async fn create(&self, request: &NewAmbassadorRequest) -> Result<Ambassador, RosterError> {
        let name = request.name.trim();
        if name.is_empty() || request.cpf.trim().is_empty() || request.password.is_empty() {
            return Err(RosterError::MissingFields);
        }
        auth::validate_password(&request.password).map_err(|_| RosterError::PasswordTooShort)?;
        let national_id = NationalId::parse(&request.cpf)?;

        if self.ambassadors.national_id_exists(&national_id).await? {
            return Err(RosterError::DuplicateNationalId);
        }

        let password_hash =
            auth::hash_password(&request.password).map_err(|_| RosterError::PasswordHash)?;
        let prefix = coupon_prefix(name);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let existing = self.ambassadors.coupons_with_prefix(&prefix).await?;
            let coupon = generate_coupon(name, &existing)?;

            let new = NewAmbassador {
                name: name.to_owned(),
                national_id: national_id.clone(),
                password_hash: password_hash.clone(),
                coupon,
                goal: DEFAULT_GOAL,
            };

            match self.ambassadors.create(&new).await {
                Ok(ambassador) => {
                    tracing::info!(
                        ambassador_id = %ambassador.id,
                        coupon = %ambassador.coupon,
                        "Ambassador created"
                    );
                    return Ok(ambassador);
                }
                Err(RepositoryError::Conflict(msg)) if msg.starts_with("coupon") => {
                    if attempt >= COUPON_RACE_RETRIES {
                        return Err(RepositoryError::Conflict(msg).into());
                    }
                    tracing::debug!(attempt, "Coupon taken concurrently, drawing again");
                }
                Err(RepositoryError::Conflict(_)) => return Err(RosterError::DuplicateNationalId),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Apply an administrator's changes to sales, lists and goal.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::InvalidValue` for out-of-range values and
    /// `RosterError::NotFound` if the ambassador does not exist.
    pub async fn update(
        &self,
        id: AmbassadorId,
        changes: AmbassadorChanges,
    ) -> Result<Ambassador, RosterError> {
        let update = AmbassadorUpdate::try_from(changes)?;

        let ambassador = self
            .ambassadors
            .update(id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RosterError::NotFound,
                other => RosterError::Repository(other),
            })?;

        tracing::info!(ambassador_id = %id, "Ambassador updated");
        Ok(ambassador)
    }

    /// Delete an ambassador.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::NotFound` if the ambassador does not exist.
    pub async fn delete(&self, id: AmbassadorId) -> Result<(), RosterError> {
        self.ambassadors.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => RosterError::NotFound,
            other => RosterError::Repository(other),
        })?;

        tracing::info!(ambassador_id = %id, "Ambassador deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::db::connect_in_memory;

    fn request(name: &str, cpf: &str, password: &str) -> NewAmbassadorRequest {
        NewAmbassadorRequest {
            name: name.to_owned(),
            cpf: cpf.to_owned(),
            password: password.to_owned(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_defaults_and_coupon() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);

        let a = roster
            .create(&request("  Maria Silva ", "52998224725", "segredo1"))
            .await
            .unwrap();
        assert_eq!(a.name, "Maria Silva");
        assert_eq!(a.national_id.as_str(), "529.982.247-25");
        assert!(a.coupon.as_str().starts_with("ODONTOMARIASIL"));
        assert_eq!(a.coupon.as_str().len(), "ODONTOMARIASIL".len() + 2);
        assert_eq!(a.total_sales, Decimal::ZERO);
        assert_eq!(a.total_lists, 0);
        assert_eq!(a.goal, DEFAULT_GOAL);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);

        assert!(matches!(
            roster.create(&request(" ", "52998224725", "segredo1")).await,
            Err(RosterError::MissingFields)
        ));
        assert!(matches!(
            roster.create(&request("Maria", "52998224725", "12345")).await,
            Err(RosterError::PasswordTooShort)
        ));
        assert!(matches!(
            roster.create(&request("Maria", "52998224724", "segredo1")).await,
            Err(RosterError::InvalidNationalId(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_cpf_is_rejected_in_any_format() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);

        roster
            .create(&request("Maria", "52998224725", "segredo1"))
            .await
            .unwrap();
        assert!(matches!(
            roster.create(&request("Other", "529.982.247-25", "segredo1")).await,
            Err(RosterError::DuplicateNationalId)
        ));
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_coupons() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);

        let a = roster
            .create(&request("Ana", "52998224725", "segredo1"))
            .await
            .unwrap();
        let b = roster
            .create(&request("Ana", "11144477735", "segredo1"))
            .await
            .unwrap();
        assert_ne!(a.coupon, b.coupon);
    }

    #[test]
    fn test_changes_validation() {
        let ok = AmbassadorUpdate::try_from(AmbassadorChanges {
            total_sales: Some(dec("1500.50")),
            total_lists: Some(dec("3")),
            goal: Some(dec("60000")),
        })
        .unwrap();
        assert_eq!(ok.total_sales, Some(dec("1500.5")));
        assert_eq!(ok.total_lists, Some(3));
        assert_eq!(ok.goal, Some(dec("60000")));

        let zero = AmbassadorUpdate::try_from(AmbassadorChanges {
            total_sales: Some(Decimal::ZERO),
            total_lists: Some(Decimal::ZERO),
            goal: None,
        })
        .unwrap();
        assert_eq!(zero.total_lists, Some(0));

        for bad in [
            AmbassadorChanges {
                total_sales: Some(dec("-1")),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_lists: Some(dec("-2")),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_lists: Some(dec("2.5")),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                goal: Some(Decimal::ZERO),
                ..AmbassadorChanges::default()
            },
        ] {
            assert!(matches!(
                AmbassadorUpdate::try_from(bad),
                Err(RosterError::InvalidValue(_))
            ));
        }
    }

    #[test]
    fn test_changes_upper_bounds() {
        let at_bound = AmbassadorUpdate::try_from(AmbassadorChanges {
            total_sales: Some(MAX_AMOUNT),
            total_lists: Some(Decimal::from(MAX_LISTS)),
            goal: Some(MAX_AMOUNT),
        })
        .unwrap();
        assert_eq!(at_bound.total_sales, Some(dec("1000000000000")));
        assert_eq!(at_bound.total_lists, Some(MAX_LISTS));

        for bad in [
            AmbassadorChanges {
                total_sales: Some(dec("1000000000000.01")),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_sales: Some(Decimal::MAX),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_lists: Some(Decimal::from(MAX_LISTS + 1)),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_lists: Some(Decimal::from(i64::MAX)),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                total_lists: Some(dec("100000000000000000000")),
                ..AmbassadorChanges::default()
            },
            AmbassadorChanges {
                goal: Some(Decimal::MAX),
                ..AmbassadorChanges::default()
            },
        ] {
            assert!(matches!(
                AmbassadorUpdate::try_from(bad),
                Err(RosterError::InvalidValue(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_update_rejects_huge_values_and_keeps_row() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);
        let a = roster
            .create(&request("Maria", "52998224725", "segredo1"))
            .await
            .unwrap();

        let huge = AmbassadorChanges {
            total_sales: Some(dec("1000000000000000000000000000")),
            total_lists: Some(Decimal::from(i64::MAX)),
            goal: None,
        };
        assert!(matches!(
            roster.update(a.id, huge).await,
            Err(RosterError::InvalidValue(_))
        ));

        let stored = AmbassadorRepository::new(&pool)
            .get_by_id(a.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_sales, Decimal::ZERO);
        assert_eq!(stored.total_lists, 0);
    }

    #[test]
    fn test_changes_accept_numbers_and_strings() {
        let changes: AmbassadorChanges =
            serde_json::from_str(r#"{"total_sales": "1234.56", "total_lists": 4, "goal": 70000.0}"#)
                .unwrap();
        assert_eq!(changes.total_sales, Some(dec("1234.56")));
        assert_eq!(changes.total_lists, Some(dec("4")));
        assert_eq!(changes.goal, Some(dec("70000")));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let pool = connect_in_memory().await.unwrap();
        let roster = RosterService::new(&pool);
        let missing = AmbassadorId::new(42);

        assert!(matches!(
            roster.update(missing, AmbassadorChanges::default()).await,
            Err(RosterError::NotFound)
        ));
        assert!(matches!(roster.delete(missing).await, Err(RosterError::NotFound)));
    }
}
