//! Ranking Core - Domain types for the ambassador ranking service.
//!
//! This crate provides the types shared by the `ranking-web` server and the
//! `ranking-cli` operator tool:
//!
//! - typed IDs for ambassadors and administrators
//! - CPF validation and formatting ([`national_id`])
//! - coupon code generation ([`coupon`])
//! - sales goal progress and currency formatting ([`progress`])
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP. The optional `sqlite` feature adds `sqlx`
//! encoding for the ID and email types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
