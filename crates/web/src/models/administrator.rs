//! Administrator domain type.

use chrono::{DateTime, Utc};

use ranking_core::{AdministratorId, Email};

/// An administrator account.
///
/// The password hash stays in the repository; it never leaves
/// [`crate::services::auth`].
#[derive(Debug, Clone)]
pub struct Administrator {
    pub id: AdministratorId,
    pub username: String,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
