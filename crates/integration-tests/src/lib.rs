//! Integration tests for the Slooze dashboard.
//!
//! [`MockBackend`] serves the ordering API from an in-process axum router on
//! an ephemeral port, so the real reqwest client and the full `Dashboard`
//! can be exercised over HTTP without an external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p slooze-integration-tests
//! ```
//!
//! # Accounts
//!
//! | email | role | password |
//! |---|---|---|
//! | `nick@slooze.xyz` | ADMIN | `password123` |
//! | `carol@slooze.xyz` | MANAGER | `password123` |
//! | `steve@slooze.xyz` | MEMBER | `password123` |

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use slooze_core::{MenuItemId, OrderId, OrderLineId, OrderStatus, Price, RestaurantId, Role};
use slooze_dashboard::api::{
    CreateOrderRequest, HttpApi, MenuItem, Order, OrderCustomer, OrderLine, OrderedItem,
    Restaurant, RestaurantMenu,
};
use slooze_dashboard::notify::{LogNotifier, Notification, Notifier};
use slooze_dashboard::store::{SessionPersistence, SessionStore};
use slooze_dashboard::Dashboard;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub const PASSWORD: &str = "password123";
pub const ADMIN_EMAIL: &str = "nick@slooze.xyz";
pub const MANAGER_EMAIL: &str = "carol@slooze.xyz";
pub const MEMBER_EMAIL: &str = "steve@slooze.xyz";

/// Keeps every notification for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }
}

/// A request the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Raw `Authorization` header, if any.
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// POSTs other than login, i.e. requests that change orders.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.method == "POST" && self.path != "/auth/login"
    }
}

struct Account {
    email: &'static str,
    name: &'static str,
    role: Role,
    country: &'static str,
}

static ACCOUNTS: [Account; 3] = [
    Account {
        email: ADMIN_EMAIL,
        name: "Nick Fury",
        role: Role::Admin,
        country: "America",
    },
    Account {
        email: MANAGER_EMAIL,
        name: "Carol Danvers",
        role: Role::Manager,
        country: "India",
    },
    Account {
        email: MEMBER_EMAIL,
        name: "Steve Rogers",
        role: Role::Member,
        country: "America",
    },
];

fn token_for(email: &str) -> String {
    format!("mock-token:{email}")
}

struct StoredOrder {
    owner: &'static str,
    order: Order,
}

#[derive(Default)]
struct BackendState {
    menus: Vec<RestaurantMenu>,
    orders: Vec<StoredOrder>,
    requests: Vec<RecordedRequest>,
    order_bodies: Vec<Value>,
    fail_next: Option<StatusCode>,
    next_order_id: i32,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "message": message,
        "error": status.canonical_reason().unwrap_or("Error"),
    });
    (status, Json(body)).into_response()
}

fn caller(headers: &HeaderMap) -> Result<&'static Account, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))?;

    ACCOUNTS
        .iter()
        .find(|account| token_for(account.email) == token)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };

    let injected = {
        let mut state = lock(&state);
        state.requests.push(recorded);
        state.fail_next.take()
    };

    if let Some(status) = injected {
        return error(status, "Injected failure");
    }
    next.run(request).await
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    let account = ACCOUNTS
        .iter()
        .find(|account| account.email == body.email && body.password == PASSWORD);

    match account {
        Some(account) => Json(json!({
            "access_token": token_for(account.email),
            "user": {
                "name": account.name,
                "role": account.role,
                "country": account.country,
            },
        }))
        .into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn restaurants(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = caller(&headers) {
        return response;
    }
    let list: Vec<Restaurant> = lock(&state)
        .menus
        .iter()
        .map(|menu| Restaurant {
            id: menu.id,
            name: menu.name.clone(),
            country: menu.country.clone(),
        })
        .collect();
    Json(list).into_response()
}

async fn restaurant(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Response {
    if let Err(response) = caller(&headers) {
        return response;
    }
    lock(&state)
        .menus
        .iter()
        .find(|menu| menu.id == RestaurantId::new(id))
        .map_or_else(
            || error(StatusCode::NOT_FOUND, "Restaurant not found"),
            |menu| Json(menu.clone()).into_response(),
        )
}

async fn orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let account = match caller(&headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    let state = lock(&state);
    let visible: Vec<Order> = state
        .orders
        .iter()
        .filter(|stored| account.role != Role::Member || stored.owner == account.email)
        .map(|stored| {
            let mut order = stored.order.clone();
            if account.role == Role::Member {
                order.user = None;
            }
            order
        })
        .collect();
    Json(visible).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let account = match caller(&headers) {
        Ok(account) => account,
        Err(response) => return response,
    };

    let mut state = lock(&state);
    state.order_bodies.push(body.clone());

    if account.role == Role::Member {
        return error(StatusCode::FORBIDDEN, "Forbidden resource");
    }
    let Ok(request) = serde_json::from_value::<CreateOrderRequest>(body) else {
        return error(StatusCode::BAD_REQUEST, "Invalid order body");
    };
    if request.items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "items should not be empty");
    }

    let mut lines = Vec::with_capacity(request.items.len());
    for (line_id, input) in (1..).zip(&request.items) {
        let Some(item) = state
            .menus
            .iter()
            .flat_map(|menu| &menu.menu_items)
            .find(|item| item.id == input.menu_item_id)
        else {
            return error(StatusCode::NOT_FOUND, "Menu item not found");
        };
        lines.push(OrderLine {
            id: Some(OrderLineId::new(line_id)),
            quantity: input.quantity,
            menu_item: OrderedItem {
                name: item.name.clone(),
                price: item.price,
            },
        });
    }

    state.next_order_id += 1;
    let order = Order {
        id: OrderId::new(state.next_order_id),
        total_amount: lines.iter().map(OrderLine::line_total).sum(),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        items: lines,
        user: Some(OrderCustomer {
            name: account.name.to_string(),
            email: account.email.to_string(),
        }),
    };
    state.orders.push(StoredOrder {
        owner: account.email,
        order: order.clone(),
    });

    (StatusCode::CREATED, Json(order)).into_response()
}

fn transition(
    state: &Shared,
    headers: &HeaderMap,
    id: i32,
    next: OrderStatus,
    allowed: &[Role],
) -> Response {
    let account = match caller(headers) {
        Ok(account) => account,
        Err(response) => return response,
    };
    if !allowed.contains(&account.role) {
        return error(StatusCode::FORBIDDEN, "Forbidden resource");
    }

    let mut state = lock(state);
    let Some(stored) = state
        .orders
        .iter_mut()
        .find(|stored| stored.order.id == OrderId::new(id))
    else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };
    if !stored.order.status.can_transition_to(next) {
        return error(StatusCode::BAD_REQUEST, "Order is not pending");
    }

    stored.order.status = next;
    Json(stored.order.clone()).into_response()
}

async fn pay(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i32>) -> Response {
    transition(&state, &headers, id, OrderStatus::Paid, &[Role::Admin])
}

async fn cancel(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i32>) -> Response {
    transition(
        &state,
        &headers,
        id,
        OrderStatus::Cancelled,
        &[Role::Admin, Role::Manager],
    )
}

fn menu_item(id: i32, restaurant: i32, name: &str, cents: u32) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_string(),
        price: Price::from_cents(cents),
        image_url: Some(format!("https://images.slooze.xyz/{id}.png")),
        restaurant_id: RestaurantId::new(restaurant),
    }
}

fn seed_menus() -> Vec<RestaurantMenu> {
    vec![
        RestaurantMenu {
            id: RestaurantId::new(1),
            name: "Burger Barn".to_string(),
            country: "America".to_string(),
            menu_items: vec![
                menu_item(10, 1, "Burger", 1250),
                menu_item(11, 1, "Fries", 400),
            ],
        },
        RestaurantMenu {
            id: RestaurantId::new(2),
            name: "Taj Mahal".to_string(),
            country: "India".to_string(),
            menu_items: vec![
                menu_item(20, 2, "Butter Chicken", 1250),
                menu_item(21, 2, "Naan", 200),
            ],
        },
    ]
}

/// In-process ordering backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Bind on `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            menus: seed_menus(),
            next_order_id: 40,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/restaurants", get(restaurants))
            .route("/restaurants/{id}", get(restaurant))
            .route("/orders", get(orders).post(create_order))
            .route("/orders/{id}/pay", post(pay))
            .route("/orders/{id}/cancel", post(cancel))
            .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL of the running backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the address is always a valid URL.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("valid url")
    }

    /// reqwest client for this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn api(&self) -> HttpApi {
        HttpApi::new(self.url(), Duration::from_secs(5)).expect("http client")
    }

    /// Signed-out dashboard wired to this backend.
    #[must_use]
    pub fn dashboard(&self) -> Dashboard<HttpApi> {
        self.dashboard_with(SessionPersistence::Memory, Box::new(LogNotifier))
    }

    /// Dashboard with the given session persistence, restoring any saved session.
    #[must_use]
    pub fn dashboard_with(
        &self,
        persistence: SessionPersistence,
        notifier: Box<dyn Notifier>,
    ) -> Dashboard<HttpApi> {
        Dashboard::new(self.api(), SessionStore::restore(persistence), notifier)
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// How many order-changing requests were received.
    #[must_use]
    pub fn write_count(&self) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|request| request.is_write())
            .count()
    }

    /// Raw JSON bodies of every `POST /orders`.
    #[must_use]
    pub fn order_bodies(&self) -> Vec<Value> {
        lock(&self.state).order_bodies.clone()
    }

    /// Answer the next request with `status` regardless of route.
    pub fn fail_next(&self, status: StatusCode) {
        lock(&self.state).fail_next = Some(status);
    }

    /// Insert an order owned by `owner` directly.
    pub fn seed_order(&self, owner: &'static str, status: OrderStatus, cents: u32) -> OrderId {
        let mut state = lock(&self.state);
        state.next_order_id += 1;
        let id = OrderId::new(state.next_order_id);
        let name = ACCOUNTS
            .iter()
            .find(|account| account.email == owner)
            .map_or("Unknown", |account| account.name);

        state.orders.push(StoredOrder {
            owner,
            order: Order {
                id,
                total_amount: Price::from_cents(cents),
                status,
                created_at: Utc::now(),
                items: Vec::new(),
                user: Some(OrderCustomer {
                    name: name.to_string(),
                    email: owner.to_string(),
                }),
            },
        });
        id
    }

    /// Status of an order as the backend sees it.
    #[must_use]
    pub fn order_status(&self, id: OrderId) -> Option<OrderStatus> {
        lock(&self.state)
            .orders
            .iter()
            .find(|stored| stored.order.id == id)
            .map(|stored| stored.order.status)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
