//! GraphQL [`Mutation`]s definitions.

use common::{DateTime, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::{eligibility, sale},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Purchases a single unit of the specified `FlashSaleItem` by the
    /// current user.
    ///
    /// A user may purchase each `FlashSaleItem` only once. The purchase is
    /// never retried automatically: clients may retry on a `409` status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `INVALID_TOKEN` - the authorization token is invalid or expired;
    /// - `ITEM_NOT_FOUND` - the `FlashSaleItem` does not exist;
    /// - `NOT_ACTIVE` - the `FlashSale` is disabled;
    /// - `NOT_STARTED` - the `FlashSale` hasn't started yet;
    /// - `ENDED` - the `FlashSale` has ended;
    /// - `SOLD_OUT` - every unit is sold;
    /// - `ALREADY_PURCHASED` - the current user has purchased the
    ///                         `FlashSaleItem` already;
    /// - `CONCURRENT_MODIFICATION` - the purchase lost to a concurrent one.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "purchaseFlashSaleItem",
            item.id = %item_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn purchase_flash_sale_item(
        item_id: api::sale::item::Id,
        ctx: &Context,
    ) -> Result<api::Purchase, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::PurchaseSaleItem {
                user_id: my_id,
                item_id: item_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `FlashSale`.
    ///
    /// The `FlashSale` is enabled unless `isActive` is `false`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator;
    /// - `INVALID_TIME_WINDOW` - `endTime` is not after `startTime`.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = %end_time.to_rfc3339(),
            gql.name = "createFlashSale",
            is_active = ?is_active,
            name = %name,
            otel.name = Self::SPAN_NAME,
            start_time = %start_time.to_rfc3339(),
        ),
    )]
    pub async fn create_flash_sale(
        name: api::sale::Name,
        start_time: DateTime,
        end_time: DateTime,
        is_active: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Sale, Error> {
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(command::CreateSale {
                name: name.into(),
                start_time: start_time.coerce(),
                end_time: end_time.coerce(),
                is_active,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the specified `FlashSale`, leaving the omitted fields intact.
    ///
    /// Whenever any bound of the time window is provided, the resulting window
    /// (provided bounds over the stored ones) is checked.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator;
    /// - `INVALID_TIME_WINDOW` - the resulting `endTime` is not after
    ///                           `startTime`;
    /// - `SALE_NOT_EXISTS` - the `FlashSale` with the specified ID does not
    ///                       exist.
    #[tracing::instrument(
        skip_all,
        fields(
            end_time = ?end_time.map(|t| t.to_rfc3339()),
            gql.name = "updateFlashSale",
            id = %id,
            is_active = ?is_active,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            start_time = ?start_time.map(|t| t.to_rfc3339()),
        ),
    )]
    pub async fn update_flash_sale(
        id: api::sale::Id,
        name: Option<api::sale::Name>,
        start_time: Option<DateTime>,
        end_time: Option<DateTime>,
        is_active: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Sale, Error> {
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(command::UpdateSale {
                sale_id: id.into(),
                name: name.map(Into::into),
                start_time: start_time.map(DateTime::coerce),
                end_time: end_time.map(DateTime::coerce),
                is_active,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Adds a new `FlashSaleItem` to the specified `FlashSale`.
    ///
    /// `price` is the sale price of a single unit in cents.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator;
    /// - `INVALID_MAX_QUANTITY` - `maxQuantity` is not positive;
    /// - `SALE_NOT_EXISTS` - the `FlashSale` does not exist;
    /// - `PRODUCT_NOT_EXISTS` - the catalog product does not exist;
    /// - `VARIANT_NOT_EXISTS` - the catalog product variant does not exist;
    /// - `VARIANT_NOT_OF_PRODUCT` - the catalog product variant belongs to
    ///                              another product.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "addFlashSaleItem",
            max_quantity = max_quantity,
            otel.name = Self::SPAN_NAME,
            price = %price,
            product.id = %product_id,
            sale.id = %sale_id,
            variant.id = ?variant_id.map(|id| id.to_string()),
        ),
    )]
    pub async fn add_flash_sale_item(
        sale_id: api::sale::Id,
        product_id: api::product::Id,
        variant_id: Option<api::product::VariantId>,
        price: Money,
        max_quantity: i32,
        ctx: &Context,
    ) -> Result<api::sale::Item, Error> {
        _ = ctx.admin_session().await?;

        let max_quantity = sale::item::Quantity::new(max_quantity)
            .ok_or_else(|| SaleItemError::InvalidMaxQuantity.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::AddSaleItem {
                sale_id: sale_id.into(),
                product_id: product_id.into(),
                variant_id: variant_id.map(Into::into),
                price,
                max_quantity,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Removes the specified `FlashSaleItem` from its `FlashSale`.
    ///
    /// Purchases of the removed `FlashSaleItem` are kept.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator;
    /// - `SALE_ITEM_NOT_EXISTS` - the `FlashSaleItem` does not exist in the
    ///                            `FlashSale`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "removeFlashSaleItem",
            item.id = %item_id,
            otel.name = Self::SPAN_NAME,
            sale.id = %sale_id,
        ),
    )]
    pub async fn remove_flash_sale_item(
        sale_id: api::sale::Id,
        item_id: api::sale::item::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(command::RemoveSaleItem {
                sale_id: sale_id.into(),
                item_id: item_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }
}

define_error! {
    enum SaleItemError {
        #[code = "INVALID_MAX_QUANTITY"]
        #[status = BAD_REQUEST]
        #[message = "`maxQuantity` must be positive"]
        InvalidMaxQuantity,
    }
}

define_error! {
    enum TimeWindowError {
        #[code = "INVALID_TIME_WINDOW"]
        #[status = BAD_REQUEST]
        #[message = "`endTime` must be after `startTime`"]
        Invalid,
    }
}

impl AsError for command::purchase_sale_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Ineligible(reason) => reason.try_as_error(),
            Self::ConcurrentModification => Some(Error::of_class(
                eligibility::Class::Conflict,
                "CONCURRENT_MODIFICATION",
                self,
            )),
        }
    }
}

impl AsError for command::create_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidTimeWindow => Some(TimeWindowError::Invalid.into()),
        }
    }
}

impl AsError for command::update_sale::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidTimeWindow => TimeWindowError::Invalid.into(),
            Self::SaleNotExists(_) => api::query::SaleError::NotExists.into(),
        })
    }
}

impl AsError for command::add_sale_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PRODUCT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "Catalog product with the specified ID does not \
                             exist"]
                ProductNotExists,

                #[code = "VARIANT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "Catalog product variant with the specified ID \
                             does not exist"]
                VariantNotExists,

                #[code = "VARIANT_NOT_OF_PRODUCT"]
                #[status = BAD_REQUEST]
                #[message = "Catalog product variant belongs to another \
                             product"]
                VariantNotOfProduct,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ProductNotExists(_) => Error::ProductNotExists.into(),
            Self::SaleNotExists(_) => api::query::SaleError::NotExists.into(),
            Self::VariantNotExists(_) => Error::VariantNotExists.into(),
            Self::VariantNotOfProduct { .. } => {
                Error::VariantNotOfProduct.into()
            }
            Self::ZeroMaxQuantity => SaleItemError::InvalidMaxQuantity.into(),
        })
    }
}

impl AsError for command::remove_sale_item::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SALE_ITEM_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`FlashSaleItem` with the specified ID does not \
                             exist in the `FlashSale`"]
                NotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ItemNotExists(_) => Some(Error::NotExists.into()),
        }
    }
}
