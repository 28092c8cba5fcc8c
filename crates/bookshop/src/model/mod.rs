//! Plain data structures for books, order lines, orders and users.

/// Declares a type-safe `u32` identifier that displays with a prefix (`book_7`).
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub u32);

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

pub(crate) use entity_id;

pub mod book;
pub mod item;
pub mod order;
pub mod user;

pub use book::*;
pub use item::*;
pub use order::*;
pub use user::*;
