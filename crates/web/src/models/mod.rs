//! Domain models for the ranking server.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`].

pub mod administrator;
pub mod ambassador;
pub mod session;

pub use administrator::Administrator;
pub use ambassador::{Ambassador, AmbassadorUpdate, NewAmbassador};
pub use session::{IdentityKind, SessionIdentities};
