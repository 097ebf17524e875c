//! [`Purchase`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, Context};

/// A flash sale purchase.
#[derive(Clone, Debug, From)]
pub struct Purchase(domain::Purchase);

/// A purchase of a single `FlashSaleItem` unit at its sale price.
#[graphql_object(name = "FlashSalePurchase", context = Context)]
impl Purchase {
    /// Unique identifier of this `FlashSalePurchase`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the user who made this `FlashSalePurchase`.
    #[must_use]
    pub fn user_id(&self) -> api::user::Id {
        self.0.user_id.into()
    }

    /// ID of the purchased `FlashSaleItem`.
    ///
    /// The `FlashSaleItem` may be removed from its `FlashSale` afterwards.
    #[must_use]
    pub fn item_id(&self) -> api::sale::item::Id {
        self.0.item_id.into()
    }

    /// ID of the purchased catalog product.
    #[must_use]
    pub fn product_id(&self) -> api::product::Id {
        self.0.product_id.into()
    }

    /// ID of the purchased catalog product variant, if any.
    #[must_use]
    pub fn variant_id(&self) -> Option<api::product::VariantId> {
        self.0.variant_id.map(Into::into)
    }

    /// Price paid for the unit.
    #[must_use]
    pub fn price(&self) -> Money {
        self.0.price
    }

    /// `DateTime` when this `FlashSalePurchase` was made.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `FlashSalePurchase`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::purchase::Id)]
#[into(domain::purchase::Id)]
#[graphql(name = "FlashSalePurchaseId", transparent)]
pub struct Id(Uuid);
