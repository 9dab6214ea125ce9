//! Domain types for the Slooze dashboard.
//!
//! This module provides type-safe wrappers for the concepts the dashboard
//! passes around: identifiers, money, quantities and the role policy.

pub mod email;
pub mod id;
pub mod permission;
pub mod price;
pub mod quantity;
pub mod status;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::Action;
pub use price::{Price, PriceError};
pub use quantity::Quantity;
pub use status::{OrderStatus, Role};
pub use token::BearerToken;
