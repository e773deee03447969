//! Domain types for the ambassador ranking service.
//!
//! This module provides type-safe wrappers for the values that cross the
//! HTTP and storage boundaries.

pub mod coupon;
pub mod email;
pub mod id;
pub mod national_id;
pub mod progress;

pub use coupon::{Coupon, CouponError, generate_coupon};
pub use email::{Email, EmailError};
pub use id::*;
pub use national_id::{NationalId, NationalIdError};
pub use progress::{DEFAULT_GOAL, GoalProgress};
