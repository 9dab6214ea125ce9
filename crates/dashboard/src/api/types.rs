//! Wire types for the ordering backend.
//!
//! Field names follow the backend's JSON (`camelCase`, except the login
//! response's `access_token`).

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use slooze_core::{
    BearerToken, Email, MenuItemId, OrderId, OrderLineId, OrderStatus, Price, Quantity,
    RestaurantId, Role,
};

/// Email and password entered on the login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email.
    pub email: Email,
    /// Account password.
    pub password: SecretString,
}

/// Body of `POST /auth/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Token to attach to every later request.
    pub access_token: BearerToken,
    /// The signed-in user.
    pub user: UserProfile,
}

/// Profile of the signed-in user, as asserted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name ("Nick Fury").
    pub name: String,
    /// Permission class.
    pub role: Role,
    /// Country the user orders from.
    pub country: String,
}

impl UserProfile {
    /// First word of the display name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Entry of `GET /restaurants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub country: String,
}

/// Response of `GET /restaurants/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantMenu {
    pub id: RestaurantId,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
}

impl RestaurantMenu {
    /// Look up a dish on this menu.
    #[must_use]
    pub fn item(&self, id: MenuItemId) -> Option<&MenuItem> {
        self.menu_items.iter().find(|item| item.id == id)
    }
}

/// A dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub restaurant_id: RestaurantId,
}

/// An order as returned by `GET /orders` and `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Who placed the order. Only present on lists fetched by managers and admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderCustomer>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Not every backend version sends line ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderLineId>,
    pub quantity: Quantity,
    pub menu_item: OrderedItem,
}

impl OrderLine {
    /// Price of this line at the menu price recorded on the order.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.menu_item.price.times(self.quantity)
    }
}

/// Menu item snapshot embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub name: String,
    pub price: Price,
}

/// The user who placed an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
}

/// Body of `POST /orders`.
///
/// Carries only item IDs and quantities; the backend prices the order itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// One `{menuItemId, quantity}` pair of an order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_item_id: MenuItemId,
    pub quantity: Quantity,
}
