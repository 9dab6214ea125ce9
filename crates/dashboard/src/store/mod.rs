//! Client-side state: the signed-in session and the shopping cart.
//!
//! Both stores are plain values owned by [`crate::Dashboard`] and passed by
//! reference to the workflows that need them.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartLine};
pub use session::{SessionIdentity, SessionPersistence, SessionStore};
