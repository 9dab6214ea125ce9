//! Role-based permission policy.
//!
//! Every role check in the dashboard goes through [`Role::can`]. The policy
//! only decides which affordances the client offers; the backend enforces
//! authorization on its own and may still refuse an allowed action.

use core::fmt;

use crate::Role;

/// Something a signed-in user may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// List restaurants and open menus.
    BrowseRestaurants,
    /// See the orders list (members only see their own, server-side).
    ViewOrders,
    /// Check out the cart.
    PlaceOrder,
    /// Confirm payment of a pending order.
    PayOrder,
    /// Cancel a pending order.
    CancelOrder,
}

impl Action {
    /// Short description used in denial messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::BrowseRestaurants => "browse restaurants",
            Self::ViewOrders => "view orders",
            Self::PlaceOrder => "place orders",
            Self::PayOrder => "confirm payments",
            Self::CancelOrder => "cancel orders",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl Role {
    /// Whether this role may perform `action`.
    ///
    /// | action | ADMIN | MANAGER | MEMBER |
    /// |---|---|---|---|
    /// | browse / view orders | yes | yes | yes |
    /// | place order | yes | yes | no |
    /// | cancel order | yes | yes | no |
    /// | pay order | yes | no | no |
    #[must_use]
    pub const fn can(self, action: Action) -> bool {
        match action {
            Action::BrowseRestaurants | Action::ViewOrders => true,
            Action::PlaceOrder | Action::CancelOrder => {
                matches!(self, Self::Admin | Self::Manager)
            }
            Action::PayOrder => matches!(self, Self::Admin),
        }
    }

    /// Whether this role manages everyone's orders rather than only its own.
    #[must_use]
    pub const fn manages_orders(self) -> bool {
        self.can(Action::CancelOrder)
    }
}
