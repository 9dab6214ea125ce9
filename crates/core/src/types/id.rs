//! Newtype IDs for the backend's integer keys.
//!
//! The ordering backend keys every entity with a plain integer. Wrapping each
//! kind in its own type keeps a menu item ID from being passed where an order
//! ID is expected.

/// Define a type-safe integer ID wrapper.
///
/// The generated type:
/// - is `#[serde(transparent)]`, so it reads and writes as a bare JSON number
/// - derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - converts from and into `i32`
/// - parses from a decimal string (for command-line arguments)
///
/// # Example
///
/// ```rust
/// # use slooze_core::define_id;
/// define_id!(CourierId);
///
/// let id: CourierId = "42".parse().unwrap();
/// assert_eq!(id.as_i32(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw backend ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw backend ID.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(RestaurantId);
define_id!(MenuItemId);
define_id!(OrderId);
define_id!(OrderLineId);
