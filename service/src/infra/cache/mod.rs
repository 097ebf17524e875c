//! [`Cache`]-related implementations.
//!
//! Values are stored as JSON strings under plain string [`Key`]s, so any
//! backend only needs to store strings with a TTL.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use derive_more::{AsRef, Display, Error as StdError, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product;

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "redis")]
pub use self::redis::Redis;

/// Cache operation.
pub use common::Handler as Cache;

/// Key of a [`Cache`]d value.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct Key(String);

impl Key {
    /// [`Key`] of the list of the currently active flash sales.
    #[must_use]
    pub fn active_sales() -> Self {
        Self("flash_sales:active".into())
    }

    /// [`Key`] of the flash sale offer for the provided product (and its
    /// variant, if any).
    #[must_use]
    pub fn sale_for_product(
        product_id: product::Id,
        variant_id: Option<product::VariantId>,
    ) -> Self {
        let variant = variant_id.map_or_else(|| "none".into(), |v| v.to_string());
        Self(format!("flash_sales:product:{product_id}:{variant}"))
    }

    /// [`Key`] of the current [`Epoch`] of the flash sales catalog.
    #[must_use]
    pub fn catalog_epoch() -> Self {
        Self("flash_sales:epoch".into())
    }
}

/// Random stamp of the flash sales catalog, renewed on every its change.
///
/// Lets a read racing with a change notice that the value it has just cached
/// may predate the change.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Epoch(Uuid);

impl Epoch {
    /// Time an [`Epoch`] is kept in the [`Cache`] for.
    pub const TTL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Generates a new random [`Epoch`].
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Glob-style pattern matching [`Key`]s, where `*` matches any sequence of
/// characters.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
pub struct Pattern(String);

impl Pattern {
    /// [`Pattern`] matching [`Key::sale_for_product()`] of every product.
    #[must_use]
    pub fn sales_for_products() -> Self {
        Self("flash_sales:product:*".into())
    }
}

/// Value to be put into a [`Cache`] under its [`Key`] for a limited time.
#[derive(Clone, Debug)]
pub struct Entry<T> {
    /// [`Key`] to put the `value` under.
    pub key: Key,

    /// Value to be cached.
    pub value: T,

    /// Time the `value` stays in the [`Cache`].
    pub ttl: Duration,
}

/// [`Cache`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Failed to encode or decode a [`Cache`]d value.
    #[display("Failed to encode or decode a cached value: {_0}")]
    Codec(serde_json::Error),

    /// [`Memory`] error.
    #[cfg(any(test, feature = "memory"))]
    #[display("`Memory` cache error: {_0}")]
    Memory(memory::Error),

    /// [`Redis`] error.
    #[cfg(feature = "redis")]
    #[display("`Redis` cache error: {_0}")]
    Redis(::redis::RedisError),
}

#[cfg(test)]
mod spec {
    use uuid::Uuid;

    use crate::domain::product;

    use super::{Key, Pattern};

    #[test]
    fn product_keys() {
        let product =
            product::Id::from(Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap());
        let variant = product::VariantId::from(
            Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap(),
        );

        assert_eq!(
            Key::sale_for_product(product, None).as_ref(),
            "flash_sales:product:11111111-1111-1111-1111-111111111111:none",
        );
        assert_eq!(
            Key::sale_for_product(product, Some(variant)).as_ref(),
            "flash_sales:product:11111111-1111-1111-1111-111111111111:\
             22222222-2222-2222-2222-222222222222",
        );
        assert_eq!(Key::active_sales().as_ref(), "flash_sales:active");
        assert_eq!(
            Pattern::sales_for_products().as_ref(),
            "flash_sales:product:*",
        );
    }
}
