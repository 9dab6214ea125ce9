//! View-level workflows.
//!
//! Each function here is what one screen of the dashboard does: it reads and
//! writes the stores it is handed and calls the backend through
//! [`crate::api::OrderingApi`]. Rendering is left to the front end.

pub mod catalog;
pub mod checkout;
pub mod orders;

pub use catalog::{MenuEntry, NavItem, View};
pub use checkout::checkout;
pub use orders::{OrderActions, OrderControls, OrdersBoard, StatusFilter};
