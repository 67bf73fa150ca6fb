pub mod product;
pub mod sale;
pub mod user;

pub use product::*;
pub use sale::*;
pub use user::*;

/// Declares a store-assigned integer identifier.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identity of a catalog entry. Never reused.
    ProductId
);
id_type!(
    /// Identity of a sale row. Monotonic in commit order.
    SaleId
);
id_type!(
    /// Identity of a staff member, as resolved by the authentication layer.
    UserId
);
