//! Ambassador ranking web server library.
//!
//! This crate provides the server as a library so that the binary, the CLI
//! and the integration tests share one router, one schema and one set of
//! repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
