//! [`Item`]-related definitions.

use common::{DateTime, Money, Percent};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// An item of a flash sale.
#[derive(Clone, Debug)]
pub struct Item {
    /// Underlying [`domain::SaleItem`].
    item: domain::SaleItem,

    /// Catalog product offered by this [`Item`], if it still exists.
    product: OnceCell<Option<read::product::Product>>,
}

impl From<domain::SaleItem> for Item {
    fn from(item: domain::SaleItem) -> Self {
        Self {
            item,
            product: OnceCell::new(),
        }
    }
}

impl Item {
    /// Returns the catalog product offered by this [`Item`].
    ///
    /// # Errors
    ///
    /// Errors if the catalog product cannot be loaded.
    async fn product(
        &self,
        ctx: &Context,
    ) -> Result<Option<&read::product::Product>, Error> {
        let id = self.item.product_id;
        self.product
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::product::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
            .map(Option::as_ref)
    }
}

/// An item of a flash sale: a catalog product (or one of its variants)
/// offered at a sale price in a limited quantity.
#[graphql_object(name = "FlashSaleItem", context = Context)]
impl Item {
    /// Unique identifier of this `FlashSaleItem`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.item.id.into()
    }

    /// ID of the `FlashSale` this `FlashSaleItem` belongs to.
    #[must_use]
    pub fn sale_id(&self) -> api::sale::Id {
        self.item.sale_id.into()
    }

    /// ID of the offered catalog product.
    #[must_use]
    pub fn product_id(&self) -> api::product::Id {
        self.item.product_id.into()
    }

    /// ID of the offered catalog product variant, if the offer is restricted
    /// to it.
    #[must_use]
    pub fn variant_id(&self) -> Option<api::product::VariantId> {
        self.item.variant_id.map(Into::into)
    }

    /// Sale price of a single unit.
    #[must_use]
    pub fn price(&self) -> Money {
        self.item.price
    }

    /// Regular catalog price of a single unit.
    ///
    /// `null` if the catalog product doesn't exist anymore.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "FlashSaleItem.originalPrice",
            otel.name = api::Query::SPAN_NAME,
            sale_item.id = %self.item.id,
        ),
    )]
    pub async fn original_price(
        &self,
        ctx: &Context,
    ) -> Result<Option<Money>, Error> {
        Ok(self.product(ctx).await?.map(|p| p.price))
    }

    /// Discount of the sale price relative to the regular catalog one,
    /// rounded to a whole percent.
    ///
    /// `null` if the catalog product doesn't exist anymore or is free.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "FlashSaleItem.discountPercent",
            otel.name = api::Query::SPAN_NAME,
            sale_item.id = %self.item.id,
        ),
    )]
    pub async fn discount_percent(
        &self,
        ctx: &Context,
    ) -> Result<Option<Percent>, Error> {
        Ok(self
            .product(ctx)
            .await?
            .and_then(|p| Percent::discount(p.price, self.item.price)))
    }

    /// Total number of units offered.
    #[must_use]
    pub fn max_quantity(&self) -> i32 {
        self.item.max_quantity.into()
    }

    /// Number of units sold so far.
    #[must_use]
    pub fn sold_count(&self) -> i32 {
        self.item.sold_count.into()
    }

    /// Number of units still available.
    #[must_use]
    pub fn remaining_quantity(&self) -> i32 {
        self.item.remaining_quantity().into()
    }

    /// Indicator whether every unit is sold.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.item.is_sold_out()
    }

    /// `DateTime` when this `FlashSaleItem` was added.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.item.created_at.coerce()
    }
}

/// Unique identifier of a `FlashSaleItem`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::sale::item::Id)]
#[into(domain::sale::item::Id)]
#[graphql(name = "FlashSaleItemId", transparent)]
pub struct Id(Uuid);
