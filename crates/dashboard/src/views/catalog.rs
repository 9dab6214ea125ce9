//! Restaurant list, menus, and navigation.

use slooze_core::{Action, MenuItemId, Quantity, RestaurantId, Role};
use tracing::{debug, instrument};

use crate::api::{MenuItem, OrderingApi, Restaurant, RestaurantMenu, UserProfile};
use crate::error::{AppError, Result};
use crate::notify::Notices;
use crate::store::{Cart, CartLine, SessionStore};

/// The screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Restaurants,
    Menu(RestaurantId),
    Cart,
    Orders,
}

/// One entry of the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub view: View,
}

/// Navigation entries for `role`.
#[must_use]
pub fn navigation(role: Role) -> Vec<NavItem> {
    vec![
        NavItem {
            label: "Restaurants",
            view: View::Restaurants,
        },
        NavItem {
            label: super::orders::heading(role),
            view: View::Orders,
        },
    ]
}

/// Greeting above the restaurant list.
#[must_use]
pub fn greeting(user: &UserProfile) -> String {
    format!("Hey {}, explore restaurants", user.first_name())
}

/// Fetch the restaurant list.
///
/// # Errors
///
/// Returns `NotAuthenticated` when signed out, or the mapped backend error.
#[instrument(skip_all)]
pub async fn load_restaurants<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
) -> Result<Vec<Restaurant>> {
    let token = session.current_token().ok_or(AppError::NotAuthenticated)?;
    let restaurants = api
        .restaurants(token)
        .await
        .map_err(|e| AppError::from_api(e, Action::BrowseRestaurants, "load restaurants"))?;

    debug!(count = restaurants.len(), "Restaurants loaded");
    Ok(restaurants)
}

/// Fetch one restaurant's menu.
///
/// # Errors
///
/// Returns `NotAuthenticated` when signed out, or the mapped backend error.
#[instrument(skip(api, session))]
pub async fn load_menu<A: OrderingApi>(
    api: &A,
    session: &SessionStore,
    id: RestaurantId,
) -> Result<RestaurantMenu> {
    let token = session.current_token().ok_or(AppError::NotAuthenticated)?;
    api.restaurant(token, id)
        .await
        .map_err(|e| AppError::from_api(e, Action::BrowseRestaurants, "load menu"))
}

/// A menu item with how many of it are already in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry<'a> {
    pub item: &'a MenuItem,
    pub in_cart: u32,
}

/// Menu items annotated with cart quantities.
#[must_use]
pub fn menu_entries<'a>(menu: &'a RestaurantMenu, cart: &Cart) -> Vec<MenuEntry<'a>> {
    menu.menu_items
        .iter()
        .map(|item| MenuEntry {
            item,
            in_cart: cart.quantity_of(item.id),
        })
        .collect()
}

/// Put `quantity` of `item` in the cart.
pub fn add_item(cart: &mut Cart, notices: &mut Notices, item: &MenuItem, quantity: Quantity) {
    cart.add(CartLine::from_menu_item(item, quantity));
    notices.success(format!("Added {} to cart", item.name));
}

/// Take one of `item_id` out of the cart.
///
/// # Errors
///
/// Returns `UnknownMenuItem` if the item is not in the cart.
pub fn decrease_item(cart: &mut Cart, notices: &mut Notices, item_id: MenuItemId) -> Result<()> {
    let name = cart
        .line(item_id)
        .map(|line| line.name.clone())
        .ok_or_else(|| AppError::UnknownMenuItem(item_id.to_string()))?;

    if cart.decrease(item_id).is_none() {
        notices.info(format!("Removed {name} from cart"));
    }
    Ok(())
}

/// Take every unit of `item_id` out of the cart.
///
/// # Errors
///
/// Returns `UnknownMenuItem` if the item is not in the cart.
pub fn remove_item(cart: &mut Cart, notices: &mut Notices, item_id: MenuItemId) -> Result<()> {
    let line = cart
        .remove(item_id)
        .ok_or_else(|| AppError::UnknownMenuItem(item_id.to_string()))?;
    notices.info(format!("Removed {} from cart", line.name));
    Ok(())
}

/// Find a menu item by id or (case-insensitive) name.
#[must_use]
pub fn find_item<'a>(menu: &'a RestaurantMenu, query: &str) -> Option<&'a MenuItem> {
    let query = query.trim();
    if let Ok(id) = query.parse::<MenuItemId>() {
        return menu.item(id);
    }
    menu.menu_items
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(query))
}
