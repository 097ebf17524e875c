//! Catalog projections.
//!
//! Products are owned by the catalog, so only the parts flash sales need are
//! read.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::domain::product;

/// Catalog product.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: product::Id,

    /// Name of this [`Product`].
    pub name: String,

    /// Regular price of this [`Product`].
    pub price: Money,
}

/// Variant of a catalog [`Product`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Variant {
    /// ID of this [`Variant`].
    pub id: product::VariantId,

    /// ID of the [`Product`] this [`Variant`] belongs to.
    pub product_id: product::Id,

    /// Name of this [`Variant`].
    pub name: String,
}
