//! Dashboard commands shared by the one-shot CLI and the interactive shell.
//!
//! # Usage
//!
//! ```bash
//! # Start the interactive shell
//! slooze
//!
//! # Inside the shell
//! login nick@slooze.xyz password123
//! restaurants
//! menu 1
//! add "Burger" --quantity 2
//! cart
//! checkout
//! orders pending
//! pay 41
//! ```

use std::convert::Infallible;
use std::io::Write;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use slooze_core::{MenuItemId, OrderId, Quantity, RestaurantId};
use slooze_dashboard::api::OrderingApi;
use slooze_dashboard::config::ConfigError;
use slooze_dashboard::views::{StatusFilter, View, catalog, checkout};
use slooze_dashboard::{AppError, Dashboard};
use thiserror::Error;

use crate::render;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A dashboard workflow failed. Its notice has already been queued.
    #[error(transparent)]
    Dashboard(#[from] AppError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command was malformed.
    #[error("{0}")]
    Usage(String),
}

/// What the shell does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A single shell line, parsed without a binary name.
#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

fn secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::from(value))
}

#[derive(Subcommand, Debug, Clone)]
pub enum ShellCommand {
    /// Sign in
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(env = "SLOOZE_PASSWORD", hide_env_values = true, value_parser = secret)]
        password: SecretString,
    },
    /// Sign out (the cart is kept)
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List restaurants
    Restaurants,
    /// Open a restaurant's menu
    Menu {
        /// Restaurant ID
        restaurant: RestaurantId,
    },
    /// Add an item from the open menu to the cart
    Add {
        /// Menu item ID or name
        item: String,

        /// How many to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Take one of an item out of the cart
    Decrease {
        /// Menu item ID
        item: MenuItemId,
    },
    /// Remove an item from the cart entirely
    Remove {
        /// Menu item ID
        item: MenuItemId,
    },
    /// Show the cart
    Cart,
    /// Empty the cart
    Clear,
    /// Place an order for the cart
    Checkout,
    /// List orders
    Orders {
        /// Status filter (`all`, `pending`, `paid`, `cancelled`)
        #[arg(default_value = "all")]
        status: StatusFilter,
    },
    /// Confirm payment of a pending order
    Pay {
        /// Order ID
        order: OrderId,
    },
    /// Cancel a pending order
    Cancel {
        /// Order ID
        order: OrderId,
    },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Run one command against the dashboard and write its output.
///
/// # Errors
///
/// Returns `CliError::Dashboard` when the workflow fails, `Usage` for bad
/// arguments, and `Io` if writing fails.
pub async fn execute<A: OrderingApi>(
    dashboard: &mut Dashboard<A>,
    command: ShellCommand,
    out: &mut impl Write,
) -> Result<Flow, CliError> {
    match command {
        ShellCommand::Login { email, password } => {
            let user = dashboard.login(&email, password).await?;
            writeln!(out, "Signed in as {} ({})", user.name, user.role)?;
        }
        ShellCommand::Logout => {
            dashboard.logout();
            writeln!(out, "Signed out")?;
        }
        ShellCommand::Whoami => match dashboard.current_user() {
            Some(user) => {
                writeln!(out, "{} ({}, {})", user.name, user.role, user.country)?;
                let nav: Vec<_> = catalog::navigation(user.role)
                    .iter()
                    .map(|item| item.label)
                    .collect();
                writeln!(out, "Sections: {}", nav.join(" | "))?;
            }
            None => writeln!(out, "Not signed in")?,
        },
        ShellCommand::Restaurants => {
            let restaurants = dashboard.restaurants().await?;
            let greeting = dashboard.current_user().map(catalog::greeting);
            writeln!(out, "{}", render::restaurants(greeting.as_deref(), &restaurants))?;
        }
        ShellCommand::Menu { restaurant } => {
            dashboard.open_menu(restaurant).await?;
            write_menu(dashboard, out)?;
        }
        ShellCommand::Add { item, quantity } => {
            let quantity = Quantity::new(quantity)
                .ok_or_else(|| CliError::Usage("quantity must be at least 1".to_string()))?;
            dashboard.add_to_cart(&item, quantity)?;
            if matches!(dashboard.view(), View::Menu(_)) {
                write_menu(dashboard, out)?;
            }
        }
        ShellCommand::Decrease { item } => {
            dashboard.decrease(item)?;
            write_cart(dashboard, out)?;
        }
        ShellCommand::Remove { item } => {
            dashboard.remove(item)?;
            write_cart(dashboard, out)?;
        }
        ShellCommand::Cart => {
            dashboard.show_cart();
            write_cart(dashboard, out)?;
        }
        ShellCommand::Clear => {
            dashboard.clear_cart();
            writeln!(out, "Cart cleared")?;
        }
        ShellCommand::Checkout => {
            let order = dashboard.checkout().await?;
            writeln!(out, "Order #{} placed for {}", order.id, order.total_amount)?;
            write_orders(dashboard, out)?;
        }
        ShellCommand::Orders { status } => {
            dashboard.set_filter(status);
            dashboard.refresh_orders().await?;
            write_orders(dashboard, out)?;
        }
        ShellCommand::Pay { order } => {
            dashboard.pay_order(order).await?;
            write_orders(dashboard, out)?;
        }
        ShellCommand::Cancel { order } => {
            dashboard.cancel_order(order).await?;
            write_orders(dashboard, out)?;
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

fn write_menu<A: OrderingApi>(dashboard: &Dashboard<A>, out: &mut impl Write) -> Result<(), CliError> {
    if let Some(menu) = dashboard.menu() {
        writeln!(out, "{}", render::menu(menu, dashboard.cart()))?;
    }
    Ok(())
}

fn write_cart<A: OrderingApi>(dashboard: &Dashboard<A>, out: &mut impl Write) -> Result<(), CliError> {
    let can_checkout = checkout::can_checkout(dashboard.role());
    writeln!(out, "{}", render::cart(dashboard.cart(), can_checkout))?;
    Ok(())
}

fn write_orders<A: OrderingApi>(dashboard: &Dashboard<A>, out: &mut impl Write) -> Result<(), CliError> {
    if let Some(role) = dashboard.role() {
        writeln!(
            out,
            "{}",
            render::orders(dashboard.orders(), role, |order| dashboard.controls(order))
        )?;
    }
    Ok(())
}
