//! Ordering backend API.
//!
//! # Architecture
//!
//! - [`OrderingApi`] is the seam between the dashboard and the backend. The
//!   workflows are generic over it so they can run against the real
//!   [`HttpApi`] or an in-memory double.
//! - The backend is the source of truth for restaurants, orders and order
//!   status. Nothing here caches or mutates orders locally.
//! - Every call except login takes the bearer token explicitly; callers that
//!   have no token never reach this module.
//!
//! # Endpoints
//!
//! | call | method | path |
//! |---|---|---|
//! | login | POST | `/auth/login` |
//! | restaurants | GET | `/restaurants` |
//! | restaurant | GET | `/restaurants/{id}` |
//! | orders | GET | `/orders` |
//! | `create_order` | POST | `/orders` |
//! | `pay_order` | POST | `/orders/{id}/pay` |
//! | `cancel_order` | POST | `/orders/{id}/cancel` |

mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;

use std::future::Future;

pub use client::HttpApi;
pub use types::*;

use slooze_core::{BearerToken, OrderId, RestaurantId};
use thiserror::Error;

/// Errors that can occur when talking to the ordering backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, bad body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Building a request URL failed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// 401 - missing, invalid or expired credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 403 - the backend refused the action for this user.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 404 - the restaurant or order does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Classify a non-success response.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(message),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Returns `true` if the request never got a response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Url(_))
    }
}

/// Operations the dashboard needs from the ordering backend.
pub trait OrderingApi: Send + Sync {
    /// Exchange credentials for a bearer token and user profile.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// List restaurants visible to the user.
    fn restaurants(
        &self,
        token: &BearerToken,
    ) -> impl Future<Output = Result<Vec<Restaurant>, ApiError>> + Send;

    /// Fetch one restaurant with its menu.
    fn restaurant(
        &self,
        token: &BearerToken,
        id: RestaurantId,
    ) -> impl Future<Output = Result<RestaurantMenu, ApiError>> + Send;

    /// List orders (scoped server-side: members only see their own).
    fn orders(
        &self,
        token: &BearerToken,
    ) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send;

    /// Place an order.
    fn create_order(
        &self,
        token: &BearerToken,
        request: &CreateOrderRequest,
    ) -> impl Future<Output = Result<Order, ApiError>> + Send;

    /// Request the PENDING → PAID transition.
    fn pay_order(
        &self,
        token: &BearerToken,
        id: OrderId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Request the PENDING → CANCELLED transition.
    fn cancel_order(
        &self,
        token: &BearerToken,
        id: OrderId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
