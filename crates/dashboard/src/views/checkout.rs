//! Turning the cart into an order.

use slooze_core::{Action, Role};
use tracing::{info, instrument, warn};

use crate::api::{CreateOrderRequest, Order, OrderingApi};
use crate::error::{AppError, Result};
use crate::notify::{Notices, Notification, Notifier};
use crate::store::{Cart, SessionStore};

/// Notice shown once the backend accepts an order.
pub const ORDER_PLACED: &str = "Order placed successfully!";

/// Place an order for everything in the cart.
///
/// Checks run in order and stop at the first failure; none of them touch the
/// cart or the network:
///
/// 1. someone must be signed in,
/// 2. their role must allow [`Action::PlaceOrder`],
/// 3. the cart must not be empty.
///
/// On success the cart is cleared, a success notice is queued and an
/// "Order Placed!" notification is raised. On failure the cart is left as it
/// was so the user can retry.
///
/// # Errors
///
/// Returns `NotAuthenticated`, `AuthorizationDenied` or `EmptyCart` for the
/// local checks, and the mapped backend error if `POST /orders` fails.
#[instrument(skip_all, fields(lines = cart.lines().len()))]
pub async fn checkout<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
    cart: &mut Cart,
    notices: &mut Notices,
    notifier: &dyn Notifier,
) -> Result<Order> {
    let identity = session.identity().ok_or(AppError::NotAuthenticated)?;
    let role = identity.user.role;

    if !role.can(Action::PlaceOrder) {
        warn!(%role, "Checkout blocked for role");
        return Err(AppError::denied(
            Action::PlaceOrder,
            format!("role {role} cannot place orders"),
        ));
    }

    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total = cart.total();
    let request = CreateOrderRequest {
        items: cart.order_items(),
    };

    let order = api
        .create_order(&identity.token, &request)
        .await
        .map_err(|e| AppError::from_api(e, Action::PlaceOrder, "place order"))?;

    info!(order_id = %order.id, %total, "Order placed");
    cart.clear();
    notices.success(ORDER_PLACED);
    notifier.notify(&Notification {
        title: "Order Placed!".to_string(),
        body: format!("Your order of {total} has been confirmed."),
    });

    Ok(order)
}

/// Whether checkout should be offered at all for `role`.
#[must_use]
pub const fn can_checkout(role: Option<Role>) -> bool {
    match role {
        Some(role) => role.can(Action::PlaceOrder),
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::StatusCode;
    use slooze_core::{MenuItemId, Price, Quantity, RestaurantId};

    use super::*;
    use crate::api::fake::{self, Call, FakeApi};
    use crate::api::{Credentials, OrderItemInput};
    use crate::error::ErrorKind;
    use crate::notify::testing::RecordingNotifier;
    use crate::store::{CartLine, SessionPersistence};

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

    fn line(id: i32, cents: u32, quantity: u32) -> CartLine {
        CartLine {
            item_id: MenuItemId::new(id),
            name: format!("Item {id}"),
            unit_price: Price::from_cents(cents),
            quantity: Quantity::new(quantity).unwrap(),
            restaurant_id: RestaurantId::new(1),
        }
    }

    fn burger_and_fries() -> Cart {
        let mut cart = Cart::new();
        cart.add(line(10, 1250, 2));
        cart.add(line(11, 400, 1));
        cart
    }

    #[tokio::test]
    async fn test_member_is_rejected_without_request() {
        let api = FakeApi::seeded();
        let session = signed_in(&api, fake::MEMBER_EMAIL).await;
        let mut cart = burger_and_fries();
        let before = cart.clone();
        let mut notices = Notices::default();
        let notifier = RecordingNotifier::default();

        let err = checkout(&api, &session, &mut cart, &mut notices, &notifier)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.notice(), "Members are not allowed to place orders");
        assert_eq!(cart, before);
        assert_eq!(api.write_calls(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_without_request() {
        let api = FakeApi::seeded();
        let session = signed_in(&api, fake::MANAGER_EMAIL).await;
        let mut cart = Cart::new();
        let mut notices = Notices::default();

        let err = checkout(&api, &session, &mut cart, &mut notices, &RecordingNotifier::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmptyCart));
        assert_eq!(api.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_signed_out_is_rejected_without_request() {
        let api = FakeApi::seeded();
        let session = SessionStore::new(SessionPersistence::Memory);
        let mut cart = burger_and_fries();
        let mut notices = Notices::default();

        let err = checkout(&api, &session, &mut cart, &mut notices, &RecordingNotifier::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAuthenticated));
        assert!(api.calls().is_empty());
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_success_clears_cart_and_notifies() {
        let api = FakeApi::seeded();
        let session = signed_in(&api, fake::ADMIN_EMAIL).await;
        let mut cart = burger_and_fries();
        let mut notices = Notices::default();
        let notifier = RecordingNotifier::default();

        let order = checkout(&api, &session, &mut cart, &mut notices, &notifier)
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(order.total_amount, Price::from_cents(2900));
        assert_eq!(notices.last().unwrap().message, ORDER_PLACED);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent.first().unwrap().title, "Order Placed!");
        assert_eq!(
            sent.first().unwrap().body,
            "Your order of $29.00 has been confirmed."
        );

        // Only ids and quantities go over the wire.
        let created = api.calls().into_iter().find_map(|call| match call {
            Call::CreateOrder(request) => Some(request),
            _ => None,
        });
        assert_eq!(
            created.unwrap().items,
            vec![
                OrderItemInput {
                    menu_item_id: MenuItemId::new(10),
                    quantity: Quantity::new(2).unwrap(),
                },
                OrderItemInput {
                    menu_item_id: MenuItemId::new(11),
                    quantity: Quantity::ONE,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_cart_for_retry() {
        let api = FakeApi::seeded();
        let session = signed_in(&api, fake::MANAGER_EMAIL).await;
        let mut cart = burger_and_fries();
        let before = cart.clone();
        let mut notices = Notices::default();
        let notifier = RecordingNotifier::default();

        api.fail_next(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
        let err = checkout(&api, &session, &mut cart, &mut notices, &notifier)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NetworkOrServer);
        assert_eq!(cart, before);
        assert!(notices.is_empty());
        assert!(notifier.sent().is_empty());

        // Retry succeeds with the same cart.
        checkout(&api, &session, &mut cart, &mut notices, &notifier)
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_backend_refusal_for_manager_keeps_cart() {
        let api = FakeApi::seeded();
        let session = signed_in(&api, fake::MANAGER_EMAIL).await;
        let mut cart = burger_and_fries();
        let before = cart.clone();
        let mut notices = Notices::default();
        let notifier = RecordingNotifier::default();

        api.fail_next(StatusCode::FORBIDDEN, "Restaurant is outside your country");
        let err = checkout(&api, &session, &mut cart, &mut notices, &notifier)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_ne!(err.notice(), "Members are not allowed to place orders");
        assert_eq!(cart, before);
        assert!(notifier.sent().is_empty());
    }

    #[test]
    fn test_can_checkout() {
        assert!(can_checkout(Some(Role::Admin)));
        assert!(can_checkout(Some(Role::Manager)));
        assert!(!can_checkout(Some(Role::Member)));
        assert!(!can_checkout(None));
    }
}
