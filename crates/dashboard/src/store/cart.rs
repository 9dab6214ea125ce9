//! Client-side shopping cart.
//!
//! Lines are keyed by menu item: adding an item that is already in the cart
//! merges quantities instead of appending a second line. Totals are derived
//! by scanning the lines on every read. No operation can fail.

use slooze_core::{MenuItemId, Price, Quantity, RestaurantId};

use crate::api::{MenuItem, OrderItemInput};

/// A menu item and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Menu item this line refers to. Unique within a cart.
    pub item_id: MenuItemId,
    /// Item name shown in the cart.
    pub name: String,
    /// Menu price at the time the item was added.
    pub unit_price: Price,
    /// Always at least one.
    pub quantity: Quantity,
    /// Restaurant the item belongs to.
    pub restaurant_id: RestaurantId,
}

impl CartLine {
    /// Line for `quantity` of a menu item.
    #[must_use]
    pub fn from_menu_item(item: &MenuItem, quantity: Quantity) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            restaurant_id: item.restaurant_id,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Ordered collection of cart lines, in the order items were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add a line, merging into an existing line for the same item.
    pub fn add(&mut self, line: CartLine) {
        match self.line_mut(line.item_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }
    }

    /// Remove the line for `item_id` regardless of quantity.
    ///
    /// Returns the removed line, or `None` if the item was not in the cart.
    pub fn remove(&mut self, item_id: MenuItemId) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.item_id == item_id)?;
        Some(self.lines.remove(index))
    }

    /// Take one off the line for `item_id`, removing the line at one.
    ///
    /// Returns the line's remaining quantity (`None` once it is gone or if it
    /// was never there).
    pub fn decrease(&mut self, item_id: MenuItemId) -> Option<Quantity> {
        let line = self.line_mut(item_id)?;
        if let Some(quantity) = line.quantity.decremented() {
            line.quantity = quantity;
            return Some(quantity);
        }

        self.remove(item_id);
        None
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Σ `unit_price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Σ quantity over all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity.get()))
    }

    /// How many of `item_id` are in the cart (zero if none).
    #[must_use]
    pub fn quantity_of(&self, item_id: MenuItemId) -> u32 {
        self.line(item_id).map_or(0, |line| line.quantity.get())
    }

    #[must_use]
    pub fn contains(&self, item_id: MenuItemId) -> bool {
        self.line(item_id).is_some()
    }

    #[must_use]
    pub fn line(&self, item_id: MenuItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// `{menuItemId, quantity}` pairs for an order request.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItemInput> {
        self.lines
            .iter()
            .map(|line| OrderItemInput {
                menu_item_id: line.item_id,
                quantity: line.quantity,
            })
            .collect()
    }

    fn line_mut(&mut self, item_id: MenuItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.item_id == item_id)
    }
}
