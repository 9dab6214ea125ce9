//! Unified error handling for dashboard workflows.
//!
//! Every workflow returns `Result<T, AppError>`. [`AppError::notice`] turns an
//! error into the text shown to the user; internal details (status codes,
//! transport errors) only go to the log.

use slooze_core::{Action, EmailError, OrderId, OrderStatus};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// How an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Login rejected; shown inline on the login prompt.
    Authentication,
    /// Role-gated action refused, locally or by the backend.
    Authorization,
    /// Request failed in transit or with a non-success status.
    NetworkOrServer,
    /// A local precondition was not met; no request was made.
    Precondition,
    /// Startup configuration is invalid.
    Configuration,
}

/// Where an authorization refusal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedBy {
    /// The local role policy; no request was made.
    Policy,
    /// The backend answered 403.
    Backend,
}

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Credentials were rejected at login.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ApiError),

    /// The entered email is not a valid address.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// An action that needs a token was attempted without one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The current role may not perform the action.
    #[error("Not allowed to {action}: {message}")]
    AuthorizationDenied {
        action: Action,
        message: String,
        by: DeniedBy,
    },

    /// Checkout was attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order is not in the loaded list.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// The menu item is not on the open menu.
    #[error("Menu item not found: {0}")]
    UnknownMenuItem(String),

    /// The order's status does not allow the requested transition.
    #[error("Order {id} is {status} and can no longer change")]
    InvalidTransition { id: OrderId, status: OrderStatus },

    /// Another action on the same order has not finished yet.
    #[error("An action on order {0} is already in progress")]
    ActionInProgress(OrderId),

    /// A backend request failed.
    #[error("Failed to {context}: {source}")]
    Request {
        context: &'static str,
        #[source]
        source: ApiError,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Map a backend failure for `action`.
    ///
    /// A 403 becomes [`AppError::AuthorizationDenied`] so server-side refusals
    /// surface the same way as local ones.
    #[must_use]
    pub fn from_api(source: ApiError, action: Action, context: &'static str) -> Self {
        match source {
            ApiError::Forbidden(message) => Self::AuthorizationDenied {
                action,
                message,
                by: DeniedBy::Backend,
            },
            source => Self::Request { context, source },
        }
    }

    /// Local denial for a role that the policy does not allow.
    #[must_use]
    pub fn denied(action: Action, message: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            action,
            message: message.into(),
            by: DeniedBy::Policy,
        }
    }

    /// Which of the user-facing categories this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) | Self::InvalidEmail(_) => ErrorKind::Authentication,
            Self::NotAuthenticated | Self::AuthorizationDenied { .. } => {
                ErrorKind::Authorization
            }
            Self::Request { .. } => ErrorKind::NetworkOrServer,
            Self::EmptyCart
            | Self::OrderNotFound(_)
            | Self::UnknownMenuItem(_)
            | Self::InvalidTransition { .. }
            | Self::ActionInProgress(_) => ErrorKind::Precondition,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Message shown to the user.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Authentication(source) if source.is_transport() => {
                "Could not reach the server. Please try again.".to_string()
            }
            Self::Authentication(_) => "Login failed. Please check your credentials.".to_string(),
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::NotAuthenticated => "Please log in first.".to_string(),
            Self::AuthorizationDenied {
                action: Action::PlaceOrder,
                by: DeniedBy::Policy,
                ..
            } => "Members are not allowed to place orders".to_string(),
            Self::AuthorizationDenied {
                action: Action::PlaceOrder,
                by: DeniedBy::Backend,
                ..
            } => "Order was refused. You might not have permission.".to_string(),
            Self::AuthorizationDenied {
                action: Action::PayOrder,
                ..
            } => "Payment failed. You might not have permission.".to_string(),
            Self::AuthorizationDenied { action, .. } => {
                format!("You are not allowed to {action}.")
            }
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::OrderNotFound(id) => format!("Order #{id} was not found."),
            Self::UnknownMenuItem(item) => format!("\"{item}\" is not on this menu."),
            Self::InvalidTransition { id, status } => {
                format!("Order #{id} is already {}.", status.label().to_lowercase())
            }
            Self::ActionInProgress(id) => {
                format!("Order #{id} is still being updated. Please wait.")
            }
            Self::Request { context, .. } => format!("Failed to {context}. Please try again."),
            Self::Config(err) => err.to_string(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_maps_to_denied() {
        let err = AppError::from_api(
            ApiError::Forbidden("Forbidden resource".to_string()),
            Action::PayOrder,
            "process payment",
        );
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.notice(), "Payment failed. You might not have permission.");

        let err = AppError::denied(Action::CancelOrder, "role MEMBER");
        assert_eq!(err.notice(), "You are not allowed to cancel orders.");
    }

    #[test]
    fn test_server_error_hides_details() {
        let err = AppError::from_api(
            ApiError::Status {
                status: 500,
                message: "stack trace".to_string(),
            },
            Action::PlaceOrder,
            "place order",
        );
        assert_eq!(err.kind(), ErrorKind::NetworkOrServer);
        assert_eq!(err.notice(), "Failed to place order. Please try again.");
        assert!(err.to_string().contains("stack trace"));
    }

    #[test]
    fn test_member_checkout_message() {
        let err = AppError::denied(Action::PlaceOrder, "role MEMBER");
        assert_eq!(err.notice(), "Members are not allowed to place orders");
    }

    #[test]
    fn test_backend_order_refusal_does_not_blame_members() {
        let err = AppError::from_api(
            ApiError::Forbidden("Restaurant is outside your country".to_string()),
            Action::PlaceOrder,
            "place order",
        );
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(matches!(
            err,
            AppError::AuthorizationDenied {
                by: DeniedBy::Backend,
                ..
            }
        ));
        assert_eq!(
            err.notice(),
            "Order was refused. You might not have permission."
        );
    }

    #[test]
    fn test_authentication_notice() {
        let err = AppError::Authentication(ApiError::Unauthorized("bad".to_string()));
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.notice(), "Login failed. Please check your credentials.");
    }

    #[test]
    fn test_precondition_kinds() {
        assert_eq!(AppError::EmptyCart.kind(), ErrorKind::Precondition);
        let err = AppError::InvalidTransition {
            id: OrderId::new(4),
            status: OrderStatus::Paid,
        };
        assert_eq!(err.notice(), "Order #4 is already paid.");
    }
}
