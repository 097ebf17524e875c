//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint allowing a single [`Purchase`] per user and
/// [`SaleItem`].
///
/// [`Purchase`]: crate::domain::Purchase
/// [`SaleItem`]: crate::domain::SaleItem
pub const PURCHASE_PER_USER_CONSTRAINT: &str =
    "flash_sale_purchases_user_item_key";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    #[cfg(any(test, feature = "memory"))]
    Memory(memory::Error),

    /// [`Postgres`] error.
    #[cfg(feature = "postgres")]
    Postgres(postgres::Error),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the unique `constraint`
    /// (or of any unique constraint if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_unique_violation(constraint),
        }
    }

    /// Checks whether this [`Error`] is caused by a concurrent transaction
    /// making the current one impossible to serialize.
    #[must_use]
    pub fn is_serialization_failure(&self) -> bool {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(_) => false,
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.is_serialization_failure(),
        }
    }
}
