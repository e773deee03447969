//! Session-stored identity state.
//!
//! A browser can be signed in as an ambassador and as an administrator at
//! the same time. Both identities live in one [`SessionIdentities`] value
//! under [`keys::IDENTITIES`]; signing out of one role never touches the
//! other slot.

use serde::{Deserialize, Serialize};

use ranking_core::{AdministratorId, AmbassadorId};

/// The two kinds of identity a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Ambassador,
    Administrator,
}

impl IdentityKind {
    /// Where to send a caller who needs this identity but lacks it.
    #[must_use]
    pub const fn login_path(self) -> &'static str {
        match self {
            Self::Ambassador => "/login",
            Self::Administrator => "/admin/login",
        }
    }

    /// Message for a caller who needs this identity but lacks it.
    #[must_use]
    pub const fn login_required_message(self) -> &'static str {
        match self {
            Self::Ambassador => "Não autenticado. Faça login.",
            Self::Administrator => "Não autenticado. Faça login como administrador.",
        }
    }
}

/// Identities signed in on one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentities {
    pub ambassador: Option<AmbassadorId>,
    pub administrator: Option<AdministratorId>,
    /// First role signed in on this session. Informational only; access
    /// checks look at the slots.
    pub last_login: Option<IdentityKind>,
}

impl SessionIdentities {
    /// Fill the ambassador slot.
    pub fn sign_in_ambassador(&mut self, id: AmbassadorId) {
        self.ambassador = Some(id);
        self.last_login.get_or_insert(IdentityKind::Ambassador);
    }

    /// Fill the administrator slot.
    pub fn sign_in_administrator(&mut self, id: AdministratorId) {
        self.administrator = Some(id);
        self.last_login.get_or_insert(IdentityKind::Administrator);
    }

    /// Clear one slot. The marker is cleared only if it names `kind`.
    pub fn sign_out(&mut self, kind: IdentityKind) {
        match kind {
            IdentityKind::Ambassador => self.ambassador = None,
            IdentityKind::Administrator => self.administrator = None,
        }
        if self.last_login == Some(kind) {
            self.last_login = None;
        }
    }

    /// Returns `true` if neither slot is filled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ambassador.is_none() && self.administrator.is_none()
    }
}

/// Session keys.
pub mod keys {
    /// Key for the [`super::SessionIdentities`] of this session.
    pub const IDENTITIES: &str = "identities";
}
