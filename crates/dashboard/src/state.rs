//! Application state for one dashboard session.

use secrecy::SecretString;
use slooze_core::{Action, Email, MenuItemId, OrderId, Quantity, RestaurantId, Role};
use tracing::{info, warn};

use crate::api::{Credentials, HttpApi, Order, OrderingApi, Restaurant, RestaurantMenu, UserProfile};
use crate::config::DashboardConfig;
use crate::error::{AppError, Result};
use crate::notify::{Notice, Notices, Notifier};
use crate::store::{Cart, SessionStore};
use crate::views::{self, OrderActions, OrderControls, OrdersBoard, StatusFilter, View};

/// Everything one user session of the dashboard owns.
///
/// Holds the session and cart stores, the loaded orders list and the current
/// view, and runs the view workflows against them. Every failure is also
/// queued as an error notice, so a front end only has to drain
/// [`Dashboard::take_notices`] after each command.
pub struct Dashboard<A> {
    api: A,
    session: SessionStore,
    cart: Cart,
    orders: OrdersBoard,
    actions: OrderActions,
    notices: Notices,
    notifier: Box<dyn Notifier>,
    view: View,
    menu: Option<RestaurantMenu>,
}

impl Dashboard<HttpApi> {
    /// Build a dashboard talking to the backend named in `config`.
    ///
    /// The session is restored from disk when file persistence is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &DashboardConfig, notifier: Box<dyn Notifier>) -> Result<Self> {
        let api = HttpApi::new(config.api_url.clone(), config.request_timeout).map_err(|source| {
            AppError::Request {
                context: "create HTTP client",
                source,
            }
        })?;
        let session = SessionStore::restore(config.session.clone());

        Ok(Self::new(api, session, notifier))
    }
}

impl<A: OrderingApi> Dashboard<A> {
    /// Dashboard over an existing API client and session.
    #[must_use]
    pub fn new(api: A, session: SessionStore, notifier: Box<dyn Notifier>) -> Self {
        Self {
            api,
            session,
            cart: Cart::new(),
            orders: OrdersBoard::default(),
            actions: OrderActions::default(),
            notices: Notices::default(),
            notifier,
            view: View::default(),
            menu: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn orders(&self) -> &OrdersBoard {
        &self.orders
    }

    #[must_use]
    pub const fn actions(&self) -> &OrderActions {
        &self.actions
    }

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// The menu opened last, if any.
    #[must_use]
    pub const fn menu(&self) -> Option<&RestaurantMenu> {
        self.menu.as_ref()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.session.current_user()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.role()
    }

    /// Take every notice queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Buttons and hints for `order` under the current role.
    #[must_use]
    pub fn controls(&self, order: &Order) -> OrderControls {
        self.role()
            .map_or_else(OrderControls::default, |role| OrderControls::for_order(order, role))
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` for a malformed address and `Authentication` if
    /// the backend rejects the credentials. The session is left unchanged.
    /// On success the previous user's orders and open menu are dropped.
    pub async fn login(&mut self, email: &str, password: SecretString) -> Result<&UserProfile> {
        let result = self.try_login(email, password).await;
        self.surface(result)?;

        self.orders.reset();
        self.menu = None;
        self.view = View::Restaurants;
        self.session.current_user().ok_or(AppError::NotAuthenticated)
    }

    async fn try_login(&mut self, email: &str, password: SecretString) -> Result<()> {
        let credentials = Credentials {
            email: Email::parse(email)?,
            password,
        };

        let response = self
            .api
            .login(&credentials)
            .await
            .map_err(AppError::Authentication)?;

        self.session.login(response.access_token, response.user);
        Ok(())
    }

    /// Sign out. The cart is kept.
    pub fn logout(&mut self) {
        self.session.logout();
        self.orders.reset();
        self.menu = None;
        self.view = View::Restaurants;
    }

    // =========================================================================
    // Catalog and cart
    // =========================================================================

    /// Load the restaurant list.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, or the backend error.
    pub async fn restaurants(&mut self) -> Result<Vec<Restaurant>> {
        let result = views::catalog::load_restaurants(&self.api, &self.session).await;
        let restaurants = self.surface(result)?;
        self.view = View::Restaurants;
        Ok(restaurants)
    }

    /// Open a restaurant's menu.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, or the backend error.
    pub async fn open_menu(&mut self, id: RestaurantId) -> Result<&RestaurantMenu> {
        let result = views::catalog::load_menu(&self.api, &self.session, id).await;
        let menu = self.surface(result)?;
        self.view = View::Menu(id);
        Ok(self.menu.insert(menu))
    }

    /// Add `quantity` of an item from the open menu, by id or name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMenuItem` if no menu is open or it has no such item.
    pub fn add_to_cart(&mut self, query: &str, quantity: Quantity) -> Result<()> {
        let item = self
            .menu
            .as_ref()
            .and_then(|menu| views::catalog::find_item(menu, query))
            .cloned()
            .ok_or_else(|| AppError::UnknownMenuItem(query.trim().to_string()));
        let item = self.surface(item)?;

        views::catalog::add_item(&mut self.cart, &mut self.notices, &item, quantity);
        Ok(())
    }

    /// Take one of an item out of the cart.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMenuItem` if the item is not in the cart.
    pub fn decrease(&mut self, item_id: MenuItemId) -> Result<()> {
        let result = views::catalog::decrease_item(&mut self.cart, &mut self.notices, item_id);
        self.surface(result)
    }

    /// Remove an item from the cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMenuItem` if the item is not in the cart.
    pub fn remove(&mut self, item_id: MenuItemId) -> Result<()> {
        let result = views::catalog::remove_item(&mut self.cart, &mut self.notices, item_id);
        self.surface(result)
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Switch to the cart view.
    pub const fn show_cart(&mut self) {
        self.view = View::Cart;
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Check out the cart and switch to the orders list.
    ///
    /// # Errors
    ///
    /// See [`views::checkout::checkout`]. The cart is unchanged on error.
    pub async fn checkout(&mut self) -> Result<Order> {
        let result = views::checkout(
            &self.api,
            &self.session,
            &mut self.cart,
            &mut self.notices,
            self.notifier.as_ref(),
        )
        .await;
        let order = self.surface(result)?;

        self.view = View::Orders;
        if let Err(e) = self.orders.refresh(&self.api, &self.session).await {
            warn!(error = %e, "Order placed but list refresh failed");
            self.notices.error(e.notice());
        }

        Ok(order)
    }

    /// Reload the orders list and switch to it.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when signed out, or the backend error. The
    /// previous list is kept on error.
    pub async fn refresh_orders(&mut self) -> Result<()> {
        let result = self.orders.refresh(&self.api, &self.session).await;
        self.surface(result)?;
        self.view = View::Orders;
        Ok(())
    }

    pub const fn set_filter(&mut self, filter: StatusFilter) {
        self.orders.set_filter(filter);
    }

    /// Confirm payment of a pending order, then reload the list.
    ///
    /// # Errors
    ///
    /// See [`views::orders::request_transition`]. A failed reload after an
    /// accepted payment is only reported as an error notice.
    pub async fn pay_order(&mut self, id: OrderId) -> Result<()> {
        self.transition(id, Action::PayOrder).await?;
        self.notices.success(format!("Order #{id} Paid Successfully!"));
        self.reload_after_transition(id).await;
        Ok(())
    }

    /// Cancel a pending order, then reload the list.
    ///
    /// # Errors
    ///
    /// See [`views::orders::request_transition`]. A failed reload after an
    /// accepted cancellation is only reported as an error notice.
    pub async fn cancel_order(&mut self, id: OrderId) -> Result<()> {
        self.transition(id, Action::CancelOrder).await?;
        self.notices.info("Order Cancelled");
        self.reload_after_transition(id).await;
        Ok(())
    }

    async fn transition(&mut self, id: OrderId, action: Action) -> Result<()> {
        let result = views::orders::request_transition(
            &self.api,
            &self.session,
            &self.orders,
            &self.actions,
            id,
            action,
        )
        .await;
        self.surface(result)
    }

    async fn reload_after_transition(&mut self, id: OrderId) {
        info!(order_id = %id, "Reloading orders after status change");
        if let Err(e) = self.orders.refresh(&self.api, &self.session).await {
            warn!(order_id = %id, error = %e, "Status changed but list refresh failed");
            self.notices.error(e.notice());
        }
    }

    /// Queue an error notice for a failed step and pass the result through.
    fn surface<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "Dashboard action failed");
            self.notices.error(e.notice());
        }
        result
    }
}
