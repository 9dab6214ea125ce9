//! Slooze food-ordering dashboard.
//!
//! Client-side core of the dashboard: the signed-in session, the shopping
//! cart, role-gated checkout and order management, and the HTTP client for
//! the ordering backend. A front end drives a [`Dashboard`] and renders what
//! it exposes.
//!
//! # Modules
//!
//! - [`api`] - `OrderingApi` trait, reqwest client and wire types
//! - [`store`] - session and cart stores
//! - [`views`] - catalog, checkout and orders workflows
//! - [`notify`] - notices and order notifications
//! - [`config`] - environment configuration
//! - [`error`] - `AppError` and user-facing messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;
pub mod store;
pub mod views;

pub use config::DashboardConfig;
pub use error::{AppError, ErrorKind, Result};
pub use state::Dashboard;
