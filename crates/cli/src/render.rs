//! Terminal rendering of dashboard views.

use std::fmt::Write as _;
use std::io;

use slooze_core::Role;
use slooze_dashboard::api::{Order, Restaurant, RestaurantMenu};
use slooze_dashboard::notify::{Notice, NoticeLevel};
use slooze_dashboard::store::Cart;
use slooze_dashboard::views::orders::{heading, show_customer};
use slooze_dashboard::views::{OrderControls, OrdersBoard, StatusFilter, catalog};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

fn finish(builder: Builder, right_aligned: &[usize]) -> String {
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    for &column in right_aligned {
        table.modify(Columns::new(column..=column), Alignment::right());
    }
    table.to_string()
}

/// Restaurant list with the greeting above it.
#[must_use]
pub fn restaurants(greeting: Option<&str>, restaurants: &[Restaurant]) -> String {
    let mut out = String::new();
    if let Some(greeting) = greeting {
        let _ = writeln!(out, "{greeting}");
    }
    if restaurants.is_empty() {
        out.push_str("No restaurants available.");
        return out;
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Restaurant", "Country"]);
    for restaurant in restaurants {
        builder.push_record([
            restaurant.id.to_string(),
            restaurant.name.clone(),
            restaurant.country.clone(),
        ]);
    }
    out.push_str(&finish(builder, &[0]));
    out
}

/// A restaurant's menu with cart quantities.
#[must_use]
pub fn menu(menu: &RestaurantMenu, cart: &Cart) -> String {
    let mut out = format!("{} ({})\n", menu.name, menu.country);
    if menu.menu_items.is_empty() {
        out.push_str("No items on this menu.");
        return out;
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Item", "Price", "In cart"]);
    for entry in catalog::menu_entries(menu, cart) {
        builder.push_record([
            entry.item.id.to_string(),
            entry.item.name.clone(),
            entry.item.price.to_string(),
            if entry.in_cart == 0 {
                String::new()
            } else {
                entry.in_cart.to_string()
            },
        ]);
    }
    out.push_str(&finish(builder, &[0, 2, 3]));
    out
}

/// Cart lines and total.
#[must_use]
pub fn cart(cart: &Cart, can_checkout: bool) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Item", "Price", "Qty", "Subtotal"]);
    for line in cart.lines() {
        builder.push_record([
            line.item_id.to_string(),
            line.name.clone(),
            line.unit_price.to_string(),
            line.quantity.to_string(),
            line.line_total().to_string(),
        ]);
    }
    builder.push_record([
        String::new(),
        "Total".to_string(),
        String::new(),
        cart.item_count().to_string(),
        cart.total().to_string(),
    ]);

    let mut out = finish(builder, &[0, 2, 3, 4]);
    if !can_checkout {
        out.push_str("\nMembers cannot place orders.");
    }
    out
}

fn filter_tabs(board: &OrdersBoard) -> String {
    StatusFilter::ALL
        .iter()
        .map(|&filter| {
            let label = format!("{filter} ({})", board.count(filter));
            if filter == board.filter() {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn actions(controls: OrderControls) -> String {
    let mut parts = Vec::new();
    if controls.pay {
        parts.push("pay");
    }
    if controls.cancel {
        parts.push("cancel");
    }
    if let Some(hint) = controls.hint {
        parts.push(hint);
    }
    parts.join(", ")
}

/// Orders list for `role`, filtered by the board's current filter.
#[must_use]
pub fn orders(
    board: &OrdersBoard,
    role: Role,
    controls: impl Fn(&Order) -> OrderControls,
) -> String {
    let mut out = format!("{}\n{}\n", heading(role), filter_tabs(board));
    let shown = board.filtered();
    if shown.is_empty() {
        out.push_str("No orders found.");
        return out;
    }

    let with_customer = show_customer(role);
    let mut builder = Builder::default();
    let mut header = vec!["Order", "Placed"];
    if with_customer {
        header.push("Customer");
    }
    header.extend(["Items", "Total", "Status", "Actions"]);
    builder.push_record(header);

    for order in shown {
        let mut row = vec![
            format!("#{}", order.id),
            order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ];
        if with_customer {
            row.push(
                order
                    .user
                    .as_ref()
                    .map(|user| format!("{} <{}>", user.name, user.email))
                    .unwrap_or_default(),
            );
        }
        let items = order
            .items
            .iter()
            .map(|line| format!("{}x {}", line.quantity, line.menu_item.name))
            .collect::<Vec<_>>()
            .join(", ");
        row.extend([
            items,
            order.total_amount.to_string(),
            order.status.label().to_string(),
            actions(controls(order)),
        ]);
        builder.push_record(row);
    }

    let total_column = if with_customer { 4 } else { 3 };
    out.push_str(&finish(builder, &[total_column]));
    out
}

/// Write queued notices, one per line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_notices(out: &mut impl io::Write, notices: &[Notice]) -> io::Result<()> {
    for notice in notices {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        writeln!(out, "{prefix}: {notice}")?;
    }
    Ok(())
}
