//! Orders list and order status actions.
//!
//! The backend owns order status. This module only requests transitions and
//! then reloads the list; it never edits an [`Order`] it has fetched.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use slooze_core::{Action, OrderId, OrderStatus, Role};
use tracing::{debug, info, instrument, warn};

use crate::api::{Order, OrderingApi};
use crate::error::{AppError, Result};
use crate::store::SessionStore;

/// Which orders the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Every filter, in tab order.
    pub const ALL: [Self; 4] = [
        Self::All,
        Self::Only(OrderStatus::Pending),
        Self::Only(OrderStatus::Paid),
        Self::Only(OrderStatus::Cancelled),
    ];

    #[must_use]
    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.label(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<OrderStatus>()
            .map(Self::Only)
            .map_err(|_| format!("invalid status filter: {s} (expected all, pending, paid or cancelled)"))
    }
}

/// Page heading for the orders list.
#[must_use]
pub const fn heading(role: Role) -> &'static str {
    if role.manages_orders() {
        "Manage Orders"
    } else {
        "My Orders"
    }
}

/// Whether the list shows who placed each order.
#[must_use]
pub const fn show_customer(role: Role) -> bool {
    role.manages_orders()
}

/// What the user can do with one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderControls {
    /// Offer "Cancel Order".
    pub cancel: bool,
    /// Offer "Confirm Payment".
    pub pay: bool,
    /// Status hint shown instead of a button.
    pub hint: Option<&'static str>,
}

impl OrderControls {
    /// Controls for `order` as seen by `role`. Settled orders get none.
    #[must_use]
    pub fn for_order(order: &Order, role: Role) -> Self {
        if order.status.is_terminal() {
            return Self::default();
        }

        let hint = match role {
            Role::Admin => None,
            Role::Manager => Some("Awaiting Payment"),
            Role::Member => Some("Waiting for payment confirmation"),
        };

        Self {
            cancel: role.can(Action::CancelOrder),
            pay: role.can(Action::PayOrder),
            hint,
        }
    }
}

/// The loaded orders list and its filter.
#[derive(Debug, Default)]
pub struct OrdersBoard {
    orders: Vec<Order>,
    filter: StatusFilter,
    loaded: bool,
}

impl OrdersBoard {
    /// Reload from `GET /orders`.
    ///
    /// On failure the previously loaded list is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a request when signed out, or the
    /// mapped backend error.
    #[instrument(skip_all)]
    pub async fn refresh<A: OrderingApi>(&mut self, api: &A, session: &SessionStore) -> Result<()> {
        let token = session.current_token().ok_or(AppError::NotAuthenticated)?;

        match api.orders(token).await {
            Ok(orders) => {
                debug!(count = orders.len(), "Orders loaded");
                self.orders = orders;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load orders");
                Err(AppError::from_api(e, Action::ViewOrders, "load orders"))
            }
        }
    }

    /// Every loaded order, in backend order.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders matching the current filter.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|order| self.filter.matches(order.status))
            .collect()
    }

    /// How many loaded orders `filter` would show.
    #[must_use]
    pub fn count(&self, filter: StatusFilter) -> usize {
        self.orders
            .iter()
            .filter(|order| filter.matches(order.status))
            .count()
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    #[must_use]
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub const fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Whether a load has succeeded at least once.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drop everything, e.g. on logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Orders with a pay or cancel request in flight.
///
/// Keyed per order, so a slow payment on one order never blocks actions on
/// another.
#[derive(Debug, Clone, Default)]
pub struct OrderActions {
    in_flight: Arc<Mutex<HashSet<OrderId>>>,
}

/// Marks an order busy until dropped.
#[derive(Debug)]
pub struct ActionGuard {
    id: OrderId,
    in_flight: Arc<Mutex<HashSet<OrderId>>>,
}

impl OrderActions {
    /// Mark `id` busy. `None` if it already is.
    #[must_use]
    pub fn try_begin(&self, id: OrderId) -> Option<ActionGuard> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);

        inserted.then(|| ActionGuard {
            id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    #[must_use]
    pub fn is_busy(&self, id: OrderId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Ask the backend to mark order `id` paid.
///
/// # Errors
///
/// See [`request_transition`].
pub async fn pay_order<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
    board: &OrdersBoard,
    actions: &OrderActions,
    id: OrderId,
) -> Result<()> {
    request_transition(api, session, board, actions, id, Action::PayOrder).await
}

/// Ask the backend to cancel order `id`.
///
/// # Errors
///
/// See [`request_transition`].
pub async fn cancel_order<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
    board: &OrdersBoard,
    actions: &OrderActions,
    id: OrderId,
) -> Result<()> {
    request_transition(api, session, board, actions, id, Action::CancelOrder).await
}

/// Shared pay/cancel flow.
///
/// Rejected locally, with no request, when signed out, when the role may not
/// perform `action`, when the order is not in the loaded list or already
/// settled, or when another action on it is still running. The caller is
/// expected to refresh the board after a success.
///
/// # Errors
///
/// `NotAuthenticated`, `AuthorizationDenied`, `OrderNotFound`,
/// `InvalidTransition` or `ActionInProgress` for the local checks, and the
/// mapped backend error otherwise (403 becomes `AuthorizationDenied`).
#[instrument(skip(api, session, board, actions))]
pub async fn request_transition<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
    board: &OrdersBoard,
    actions: &OrderActions,
    id: OrderId,
    action: Action,
) -> Result<()> {
    let (target, context) = match action {
        Action::PayOrder => (OrderStatus::Paid, "process payment"),
        Action::CancelOrder => (OrderStatus::Cancelled, "cancel order"),
        other => {
            return Err(AppError::denied(other, "not an order status change"));
        }
    };

    let identity = session.identity().ok_or(AppError::NotAuthenticated)?;
    let role = identity.user.role;
    if !role.can(action) {
        return Err(AppError::denied(action, format!("role {role} cannot {action}")));
    }

    let order = board.get(id).ok_or(AppError::OrderNotFound(id))?;
    if !order.status.can_transition_to(target) {
        return Err(AppError::InvalidTransition {
            id,
            status: order.status,
        });
    }

    let _guard = actions.try_begin(id).ok_or(AppError::ActionInProgress(id))?;

    let outcome = match action {
        Action::PayOrder => api.pay_order(&identity.token, id).await,
        _ => api.cancel_order(&identity.token, id).await,
    };

    match outcome {
        Ok(()) => {
            info!(order_id = %id, status = %target, "Order transition accepted");
            Ok(())
        }
        Err(e) => Err(AppError::from_api(e, action, context)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use reqwest::StatusCode;
    use slooze_core::Price;

    use super::*;
    use crate::api::Credentials;
    use crate::api::fake::{self, Call, FakeApi};
    use crate::error::ErrorKind;
    use crate::store::SessionPersistence;

    async fn signed_in(api: &FakeApi, email: &str) -> SessionStore {
        let login = api
            .login(&Credentials {
                email: email.parse().unwrap(),
                password: fake::PASSWORD.into(),
            })
            .await
            .unwrap();
        let mut session = SessionStore::new(SessionPersistence::Memory);
        session.login(login.access_token, login.user);
        session
    }

    async fn loaded_board(api: &FakeApi, session: &SessionStore) -> OrdersBoard {
        let mut board = OrdersBoard::default();
        board.refresh(api, session).await.unwrap();
        board
    }

    fn order(id: i32, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            total_amount: Price::from_cents(1000),
            status,
            created_at: Utc::now(),
            items: Vec::new(),
            user: None,
        }
    }

    #[test]
    fn test_filter_parse_and_match() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "Paid".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Paid)
        );
        assert!("shipped".parse::<StatusFilter>().is_err());
        assert!(StatusFilter::All.matches(OrderStatus::Cancelled));
        assert!(!StatusFilter::Only(OrderStatus::Pending).matches(OrderStatus::Paid));
        assert_eq!(StatusFilter::Only(OrderStatus::Cancelled).to_string(), "Cancelled");
    }

    #[test]
    fn test_headings_and_customer_column() {
        assert_eq!(heading(Role::Admin), "Manage Orders");
        assert_eq!(heading(Role::Manager), "Manage Orders");
        assert_eq!(heading(Role::Member), "My Orders");
        assert!(show_customer(Role::Manager));
        assert!(!show_customer(Role::Member));
    }

    #[test]
    fn test_controls_per_role() {
        let pending = order(1, OrderStatus::Pending);

        let admin = OrderControls::for_order(&pending, Role::Admin);
        assert!(admin.cancel && admin.pay);
        assert_eq!(admin.hint, None);

        let manager = OrderControls::for_order(&pending, Role::Manager);
        assert!(manager.cancel && !manager.pay);
        assert_eq!(manager.hint, Some("Awaiting Payment"));

        let member = OrderControls::for_order(&pending, Role::Member);
        assert!(!member.cancel && !member.pay);
        assert_eq!(member.hint, Some("Waiting for payment confirmation"));

        let paid = order(2, OrderStatus::Paid);
        assert_eq!(OrderControls::for_order(&paid, Role::Admin), OrderControls::default());
    }

    #[test]
    fn test_guard_released_on_drop() {
        let actions = OrderActions::default();
        let id = OrderId::new(7);

        let guard = actions.try_begin(id).unwrap();
        assert!(actions.is_busy(id));
        assert!(actions.try_begin(id).is_none());
        // Other orders are unaffected.
        assert!(actions.try_begin(OrderId::new(8)).is_some());

        drop(guard);
        assert!(!actions.is_busy(id));
        assert!(actions.try_begin(id).is_some());
    }

    #[tokio::test]
    async fn test_refresh_filters_and_counts() {
        let api = FakeApi::seeded();
        api.insert_order(OrderStatus::Pending, 1000);
        api.insert_order(OrderStatus::Paid, 2000);
        api.insert_order(OrderStatus::Pending, 500);
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;

        let mut board = loaded_board(&api, &session).await;
        assert!(board.is_loaded());
        assert_eq!(board.count(StatusFilter::All), 3);
        assert_eq!(board.count(StatusFilter::Only(OrderStatus::Pending)), 2);
        assert_eq!(board.count(StatusFilter::Only(OrderStatus::Cancelled)), 0);

        board.set_filter(StatusFilter::Only(OrderStatus::Paid));
        let shown = board.filtered();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown.first().unwrap().total_amount, Price::from_cents(2000));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_list() {
        let api = FakeApi::seeded();
        api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::MANAGER_EMAIL).await;
        let mut board = loaded_board(&api, &session).await;

        api.fail_next(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
        let err = board.refresh(&api, &session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkOrServer);
        assert_eq!(board.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_pays_pending_order() {
        let api = FakeApi::seeded();
        let id = api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;
        let mut board = loaded_board(&api, &session).await;
        let actions = OrderActions::default();

        pay_order(&api, &session, &board, &actions, id).await.unwrap();
        assert!(!actions.is_busy(id));

        // The local copy only changes once the list is re-fetched.
        assert_eq!(board.get(id).unwrap().status, OrderStatus::Pending);
        board.refresh(&api, &session).await.unwrap();
        assert_eq!(board.get(id).unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_manager_cannot_pay_but_can_cancel() {
        let api = FakeApi::seeded();
        let id = api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::MANAGER_EMAIL).await;
        let board = loaded_board(&api, &session).await;
        let actions = OrderActions::default();

        let err = pay_order(&api, &session, &board, &actions, id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(api.write_calls(), 0);

        cancel_order(&api, &session, &board, &actions, id).await.unwrap();
        assert_eq!(api.order_status(id), Some(OrderStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_member_cannot_cancel() {
        let api = FakeApi::seeded();
        let id = api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::MEMBER_EMAIL).await;
        let board = loaded_board(&api, &session).await;

        let err = cancel_order(&api, &session, &board, &OrderActions::default(), id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::AuthorizationDenied {
                action: Action::CancelOrder,
                ..
            }
        ));
        assert_eq!(api.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_terminal_orders_rejected_locally() {
        let api = FakeApi::seeded();
        let paid = api.insert_order(OrderStatus::Paid, 1000);
        let cancelled = api.insert_order(OrderStatus::Cancelled, 1000);
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;
        let board = loaded_board(&api, &session).await;
        let actions = OrderActions::default();

        let err = cancel_order(&api, &session, &board, &actions, paid).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { status: OrderStatus::Paid, .. }));

        let err = pay_order(&api, &session, &board, &actions, cancelled).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let err = pay_order(&api, &session, &board, &actions, OrderId::new(404))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OrderNotFound(_)));

        assert_eq!(api.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_actions_on_same_order() {
        let api = FakeApi::seeded();
        let id = api.insert_order(OrderStatus::Pending, 1000);
        let other = api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;
        let board = loaded_board(&api, &session).await;
        let actions = OrderActions::default();

        let (first, second, third) = tokio::join!(
            pay_order(&api, &session, &board, &actions, id),
            cancel_order(&api, &session, &board, &actions, id),
            cancel_order(&api, &session, &board, &actions, other),
        );

        first.unwrap();
        assert!(matches!(second.unwrap_err(), AppError::ActionInProgress(busy) if busy == id));
        third.unwrap();

        assert_eq!(
            api.calls().iter().filter(|call| matches!(call, Call::Pay(_) | Call::Cancel(_))).count(),
            2
        );
        assert!(!actions.is_busy(id));
        assert!(!actions.is_busy(other));
    }

    #[tokio::test]
    async fn test_server_refusal_releases_guard() {
        let api = FakeApi::seeded();
        let id = api.insert_order(OrderStatus::Pending, 1000);
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;
        let board = loaded_board(&api, &session).await;
        let actions = OrderActions::default();

        api.fail_next(StatusCode::FORBIDDEN, "Forbidden resource");
        let err = pay_order(&api, &session, &board, &actions, id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(!actions.is_busy(id));
        assert_eq!(board.get(id).unwrap().status, OrderStatus::Pending);

        pay_order(&api, &session, &board, &actions, id).await.unwrap();
    }
}
