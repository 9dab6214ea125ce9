//! In-memory backend double for workflow tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use slooze_core::{
    BearerToken, MenuItemId, OrderId, OrderLineId, OrderStatus, Price, RestaurantId, Role,
};

use super::types::{
    CreateOrderRequest, Credentials, LoginResponse, MenuItem, Order, OrderCustomer, OrderLine,
    OrderedItem, Restaurant, RestaurantMenu, UserProfile,
};
use super::{ApiError, OrderingApi};

pub(crate) const PASSWORD: &str = "password123";
pub(crate) const ADMIN_EMAIL: &str = "nick@slooze.xyz";
pub(crate) const MANAGER_EMAIL: &str = "carol@slooze.xyz";
pub(crate) const MEMBER_EMAIL: &str = "steve@slooze.xyz";

/// A request the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Login(String),
    Restaurants,
    Restaurant(RestaurantId),
    Orders,
    CreateOrder(CreateOrderRequest),
    Pay(OrderId),
    Cancel(OrderId),
}

impl Call {
    pub(crate) const fn is_write(&self) -> bool {
        matches!(self, Self::CreateOrder(_) | Self::Pay(_) | Self::Cancel(_))
    }
}

struct Account {
    email: String,
    profile: UserProfile,
}

struct State {
    accounts: Vec<Account>,
    menus: Vec<RestaurantMenu>,
    orders: Vec<Order>,
    calls: Vec<Call>,
    fail_next: Option<(StatusCode, String)>,
    fail_next_orders: Option<(StatusCode, String)>,
    next_order_id: i32,
}

pub(crate) struct FakeApi {
    state: Mutex<State>,
}

fn item(id: i32, restaurant: i32, name: &str, cents: u32) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_string(),
        price: Price::from_cents(cents),
        image_url: None,
        restaurant_id: RestaurantId::new(restaurant),
    }
}

fn account(email: &str, name: &str, role: Role, country: &str) -> Account {
    Account {
        email: email.to_string(),
        profile: UserProfile {
            name: name.to_string(),
            role,
            country: country.to_string(),
        },
    }
}

pub(crate) fn token_for(email: &str) -> BearerToken {
    BearerToken::new(format!("token-{email}"))
}

impl FakeApi {
    /// Three accounts (one per role) and two restaurants.
    pub(crate) fn seeded() -> Self {
        let menus = vec![
            RestaurantMenu {
                id: RestaurantId::new(1),
                name: "Burger Barn".to_string(),
                country: "America".to_string(),
                menu_items: vec![item(10, 1, "Burger", 1250), item(11, 1, "Fries", 400)],
            },
            RestaurantMenu {
                id: RestaurantId::new(2),
                name: "Taj Mahal".to_string(),
                country: "India".to_string(),
                menu_items: vec![item(20, 2, "Butter Chicken", 1250), item(21, 2, "Naan", 200)],
            },
        ];

        Self {
            state: Mutex::new(State {
                accounts: vec![
                    account(ADMIN_EMAIL, "Nick Fury", Role::Admin, "America"),
                    account(MANAGER_EMAIL, "Carol Danvers", Role::Manager, "India"),
                    account(MEMBER_EMAIL, "Steve Rogers", Role::Member, "America"),
                ],
                menus,
                orders: Vec::new(),
                calls: Vec::new(),
                fail_next: None,
                fail_next_orders: None,
                next_order_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn write_calls(&self) -> usize {
        self.lock().calls.iter().filter(|call| call.is_write()).count()
    }

    /// Make the next request fail with `status`.
    pub(crate) fn fail_next(&self, status: StatusCode, message: &str) {
        self.lock().fail_next = Some((status, message.to_string()));
    }

    /// Make the next `GET /orders` fail with `status`, letting other calls through.
    pub(crate) fn fail_next_orders(&self, status: StatusCode, message: &str) {
        self.lock().fail_next_orders = Some((status, message.to_string()));
    }

    /// Insert an order directly, bypassing checkout.
    pub(crate) fn insert_order(&self, status: OrderStatus, cents: u32) -> OrderId {
        let mut state = self.lock();
        let id = OrderId::new(state.next_order_id);
        state.next_order_id += 1;
        state.orders.push(Order {
            id,
            total_amount: Price::from_cents(cents),
            status,
            created_at: Utc::now(),
            items: Vec::new(),
            user: None,
        });
        id
    }

    pub(crate) fn order_status(&self, id: OrderId) -> Option<OrderStatus> {
        self.lock()
            .orders
            .iter()
            .find(|order| order.id == id)
            .map(|order| order.status)
    }

    fn begin(&self, call: Call, token: Option<&BearerToken>) -> Result<Option<Role>, ApiError> {
        let mut state = self.lock();
        state.calls.push(call);

        if let Some((status, message)) = state.fail_next.take() {
            return Err(ApiError::from_status(status, message));
        }

        let Some(token) = token else {
            return Ok(None);
        };

        state
            .accounts
            .iter()
            .find(|account| token_for(&account.email) == *token)
            .map(|account| Some(account.profile.role))
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))
    }

    fn transition(
        &self,
        token: &BearerToken,
        call: Call,
        id: OrderId,
        next: OrderStatus,
        allowed: impl Fn(Role) -> bool,
    ) -> Result<(), ApiError> {
        let role = self.begin(call, Some(token))?;
        if !role.is_some_and(allowed) {
            return Err(ApiError::Forbidden("Forbidden resource".to_string()));
        }

        let mut state = self.lock();
        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

        if !order.status.can_transition_to(next) {
            return Err(ApiError::Status {
                status: 400,
                message: format!("Order is already {}", order.status),
            });
        }
        order.status = next;
        Ok(())
    }
}

impl OrderingApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let email = credentials.email.as_str().to_string();
        self.begin(Call::Login(email.clone()), None)?;

        let state = self.lock();
        let account = state
            .accounts
            .iter()
            .find(|account| account.email == email)
            .filter(|_| credentials.password.expose_secret() == PASSWORD)
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

        Ok(LoginResponse {
            access_token: token_for(&account.email),
            user: account.profile.clone(),
        })
    }

    async fn restaurants(&self, token: &BearerToken) -> Result<Vec<Restaurant>, ApiError> {
        self.begin(Call::Restaurants, Some(token))?;
        Ok(self
            .lock()
            .menus
            .iter()
            .map(|menu| Restaurant {
                id: menu.id,
                name: menu.name.clone(),
                country: menu.country.clone(),
            })
            .collect())
    }

    async fn restaurant(
        &self,
        token: &BearerToken,
        id: RestaurantId,
    ) -> Result<RestaurantMenu, ApiError> {
        self.begin(Call::Restaurant(id), Some(token))?;
        self.lock()
            .menus
            .iter()
            .find(|menu| menu.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Restaurant {id} not found")))
    }

    async fn orders(&self, token: &BearerToken) -> Result<Vec<Order>, ApiError> {
        self.begin(Call::Orders, Some(token))?;
        let mut state = self.lock();
        if let Some((status, message)) = state.fail_next_orders.take() {
            return Err(ApiError::from_status(status, message));
        }
        Ok(state.orders.clone())
    }

    async fn create_order(
        &self,
        token: &BearerToken,
        request: &CreateOrderRequest,
    ) -> Result<Order, ApiError> {
        let role = self.begin(Call::CreateOrder(request.clone()), Some(token))?;
        if role == Some(Role::Member) {
            return Err(ApiError::Forbidden("Forbidden resource".to_string()));
        }

        let mut state = self.lock();
        let mut lines = Vec::with_capacity(request.items.len());
        for (index, input) in request.items.iter().enumerate() {
            let item = state
                .menus
                .iter()
                .flat_map(|menu| &menu.menu_items)
                .find(|item| item.id == input.menu_item_id)
                .ok_or_else(|| ApiError::NotFound(format!("Menu item {} not found", input.menu_item_id)))?;
            lines.push(OrderLine {
                id: Some(OrderLineId::new(i32::try_from(index).unwrap_or(i32::MAX) + 1)),
                quantity: input.quantity,
                menu_item: OrderedItem {
                    name: item.name.clone(),
                    price: item.price,
                },
            });
        }

        let order = Order {
            id: OrderId::new(state.next_order_id),
            total_amount: lines.iter().map(OrderLine::line_total).sum(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            items: lines,
            user: Some(OrderCustomer {
                name: "Fake Customer".to_string(),
                email: "customer@slooze.xyz".to_string(),
            }),
        };
        state.next_order_id += 1;
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn pay_order(&self, token: &BearerToken, id: OrderId) -> Result<(), ApiError> {
        // Hand control back once so a concurrent caller can observe the in-flight state.
        tokio::task::yield_now().await;
        self.transition(token, Call::Pay(id), id, OrderStatus::Paid, |role| {
            role == Role::Admin
        })
    }

    async fn cancel_order(&self, token: &BearerToken, id: OrderId) -> Result<(), ApiError> {
        tokio::task::yield_now().await;
        self.transition(token, Call::Cancel(id), id, OrderStatus::Cancelled, |role| {
            matches!(role, Role::Admin | Role::Manager)
        })
    }
}
