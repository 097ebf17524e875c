//! [`Purchase`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{product, sale, user};
#[cfg(doc)]
use crate::domain::SaleItem;

/// Final sale of a single [`SaleItem`] unit to a user.
///
/// Never updated. There is at most one [`Purchase`] per user and
/// [`SaleItem`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Purchase {
    /// ID of this [`Purchase`].
    pub id: Id,

    /// ID of the user who made this [`Purchase`].
    pub user_id: user::Id,

    /// ID of the purchased [`SaleItem`].
    ///
    /// Keeps referring to the [`SaleItem`] even after it's removed.
    pub item_id: sale::item::Id,

    /// ID of the purchased product.
    pub product_id: product::Id,

    /// ID of the purchased product variant, if any.
    pub variant_id: Option<product::VariantId>,

    /// Price paid for the unit.
    pub price: Money,

    /// [`DateTime`] when this [`Purchase`] was made.
    pub created_at: CreationDateTime,
}

/// ID of a [`Purchase`].
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

/// [`DateTime`] when a [`Purchase`] was made.
pub type CreationDateTime = DateTimeOf<(Purchase, unit::Creation)>;
