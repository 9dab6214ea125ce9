//! Slooze Core - Shared domain types.
//!
//! This crate provides the types used across the Slooze dashboard components:
//! - `dashboard` - Session and cart stores, API client, order workflows
//! - `cli` - Interactive terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Anything that talks to the ordering backend lives in the
//! `dashboard` crate.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, quantities, emails, tokens, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
