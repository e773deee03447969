//! Business logic services for the ranking server.
//!
//! # Services
//!
//! - `auth` - Ambassador and administrator password authentication
//! - `roster` - Administrator management of ambassadors
//! - `seed` - Default administrator on first start

pub mod auth;
pub mod roster;
pub mod seed;
