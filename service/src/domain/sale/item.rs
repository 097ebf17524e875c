//! [`Item`] of a [`Sale`] definitions.

use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, sale};
#[cfg(doc)]
use crate::domain::{Purchase, Sale};

/// Product (or a single variant of it) offered within a [`Sale`] at a fixed
/// price and in a limited [`Quantity`].
///
/// `0 <= sold_count <= max_quantity` holds at every commit point.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Item {
    /// ID of this [`Item`].
    pub id: Id,

    /// ID of the [`Sale`] this [`Item`] belongs to.
    pub sale_id: sale::Id,

    /// ID of the offered product.
    pub product_id: product::Id,

    /// ID of the offered product variant, if the offer is restricted to it.
    pub variant_id: Option<product::VariantId>,

    /// Price of a single unit during the [`Sale`].
    pub price: Money,

    /// Maximum number of units to be sold.
    pub max_quantity: Quantity,

    /// Number of units sold already.
    pub sold_count: Quantity,

    /// [`Version`] of this [`Item`], bumped on every sold unit.
    pub version: Version,

    /// [`DateTime`] when this [`Item`] was added to its [`Sale`].
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Item {
    /// Returns the number of units still available for purchase.
    #[must_use]
    pub fn remaining_quantity(&self) -> Quantity {
        Quantity(self.max_quantity.0.saturating_sub(self.sold_count.0).max(0))
    }

    /// Indicates whether all the units of this [`Item`] are sold.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.sold_count >= self.max_quantity
    }

    /// Returns the current [`Revision`] of this [`Item`].
    #[must_use]
    pub fn revision(&self) -> Revision {
        Revision {
            sold_count: self.sold_count,
            version: self.version,
        }
    }
}

/// ID of an [`Item`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Non-negative number of [`Item`] units.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(try_from = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// Zero [`Quantity`].
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Quantity`] if the provided `value` is non-negative.
    #[must_use]
    pub const fn new(value: i32) -> Option<Self> {
        if value < 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Indicates whether this [`Quantity`] is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns the [`Quantity`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the [`Quantity`] preceding this one, stopping at zero.
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.0 > 0 {
            Self(self.0 - 1)
        } else {
            Self(0)
        }
    }
}

impl TryFrom<i32> for Quantity {
    type Error = &'static str;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("negative `Quantity`")
    }
}

/// Optimistic concurrency version of an [`Item`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Version(i64);

impl Version {
    /// [`Version`] of a freshly added [`Item`].
    pub const INITIAL: Self = Self(0);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// State of an [`Item`] a conditional write expects to find.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Revision {
    /// Expected number of sold units.
    pub sold_count: Quantity,

    /// Expected [`Version`].
    pub version: Version,
}

/// Compare-and-swap sale of a single [`Item`] unit.
///
/// Increments both the sold count and the [`Version`] of the [`Item`], but
/// only if its current state still matches the `expected` [`Revision`] and the
/// sold count stays within the maximum quantity. Nothing is written otherwise.
#[derive(Clone, Copy, Debug)]
pub struct Sell {
    /// ID of the [`Item`] to sell a unit of.
    pub id: Id,

    /// [`Revision`] the [`Item`] was read at.
    pub expected: Revision,
}

/// [`DateTime`] when an [`Item`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Item, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::{product, sale};

    use super::{Id, Item, Quantity, Revision, Version};

    fn item(max: i32, sold: i32) -> Item {
        Item {
            id: Id::new(),
            sale_id: sale::Id::new(),
            product_id: product::Id::new(),
            variant_id: None,
            price: Money::from_cents(5000).unwrap(),
            max_quantity: Quantity::new(max).unwrap(),
            sold_count: Quantity::new(sold).unwrap(),
            version: Version::INITIAL,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn remaining_quantity() {
        assert_eq!(item(10, 3).remaining_quantity(), Quantity::new(7).unwrap());
        assert_eq!(item(1, 1).remaining_quantity(), Quantity::ZERO);
    }

    #[test]
    fn sold_out() {
        assert!(!item(2, 1).is_sold_out());
        assert!(item(2, 2).is_sold_out());
    }

    #[test]
    fn revision_captures_sold_count_and_version() {
        let item = item(5, 2);

        assert_eq!(
            item.revision(),
            Revision {
                sold_count: Quantity::new(2).unwrap(),
                version: Version::INITIAL,
            },
        );
        assert_eq!(Version::INITIAL.next(), Version::from(1));
    }

    #[test]
    fn rejects_negative_quantity() {
        assert!(Quantity::new(-1).is_none());
        assert!(Quantity::try_from(-5).is_err());
        assert_eq!(Quantity::ZERO.next(), Quantity::new(1).unwrap());
    }
}
