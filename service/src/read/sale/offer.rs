//! [`Offer`] definitions.

use common::DateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{product, sale, Sale};

/// [`sale::Item`] currently offered for a product, along with its [`Sale`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Offer {
    /// [`Sale`] the [`sale::Item`] belongs to.
    pub sale: Sale,

    /// Offered [`sale::Item`].
    pub item: sale::Item,
}

/// Selector of an [`Offer`] for a product.
///
/// With a `variant_id` an [`Offer`] of that exact variant is preferred,
/// falling back to a product-wide one. Without it, only product-wide
/// [`Offer`]s match. Among several candidates the cheapest wins, and then the
/// one ending first.
#[derive(Clone, Copy, Debug)]
pub struct Selector {
    /// ID of the product to find an [`Offer`] for.
    pub product_id: product::Id,

    /// ID of the product variant to find an [`Offer`] for.
    pub variant_id: Option<product::VariantId>,

    /// Moment the [`Sale`] must be open at.
    pub at: DateTime,
}

impl Selector {
    /// Ranks the provided [`Offer`] candidate against this [`Selector`].
    ///
    /// Lower ranks are better. [`None`] means the candidate doesn't match.
    #[must_use]
    pub fn rank(&self, offer: &Offer) -> Option<impl Ord> {
        if offer.item.product_id != self.product_id
            || !offer.sale.is_open_at(self.at)
        {
            return None;
        }
        let specificity = match (offer.item.variant_id, self.variant_id) {
            (Some(have), Some(want)) if have == want => 0,
            (None, _) => 1,
            (Some(_), _) => return None,
        };
        Some((specificity, offer.item.price, offer.sale.end_time))
    }
}
