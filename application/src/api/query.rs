//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `FlashSale`s accepting purchases right now, along with
    /// their items.
    ///
    /// May lag behind the latest changes for a short while.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "activeFlashSales",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn active_flash_sales(
        ctx: &Context,
    ) -> Result<Vec<api::Sale>, Error> {
        ctx.service()
            .execute(query::sales::Active)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|listings| listings.into_iter().map(Into::into).collect())
    }

    /// Returns the `FlashSaleOffer` currently available for the specified
    /// catalog product.
    ///
    /// An offer restricted to the specified variant wins over an offer for
    /// the whole product. Among equal ones the cheapest wins.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "flashSaleForProduct",
            otel.name = Self::SPAN_NAME,
            product.id = %product_id,
            variant.id = ?variant_id.map(|id| id.to_string()),
        ),
    )]
    pub async fn flash_sale_for_product(
        product_id: api::product::Id,
        variant_id: Option<api::product::VariantId>,
        ctx: &Context,
    ) -> Result<Option<api::sale::Offer>, Error> {
        ctx.service()
            .execute(query::sale::ForProduct {
                product_id: product_id.into(),
                variant_id: variant_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|offer| offer.map(Into::into))
    }

    /// Returns the `FlashSaleItem` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SALE_ITEM_NOT_EXISTS` - the `FlashSaleItem` with the specified ID
    ///                            does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "flashSaleItem",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn flash_sale_item(
        id: api::sale::item::Id,
        ctx: &Context,
    ) -> Result<api::sale::Item, Error> {
        ctx.service()
            .execute(query::sale::item::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| SaleItemError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Checks whether the current user may purchase the specified
    /// `FlashSaleItem` right now.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `INVALID_TOKEN` - the authorization token is invalid or expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "flashSaleEligibility",
            item.id = %item_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn flash_sale_eligibility(
        item_id: api::sale::item::Id,
        ctx: &Context,
    ) -> Result<api::Eligibility, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(query::sale::item::Eligibility {
                user_id: my_id,
                item_id: item_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `FlashSalePurchase`s of the current user, the most recent
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authorized;
    /// - `INVALID_TOKEN` - the authorization token is invalid or expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myFlashSalePurchases",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_flash_sale_purchases(
        ctx: &Context,
    ) -> Result<Vec<api::Purchase>, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(query::purchases::ByUser::by(my_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|purchases| purchases.into_iter().map(Into::into).collect())
    }

    /// Returns the `FlashSale` with the specified ID, regardless of its
    /// status.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator;
    /// - `SALE_NOT_EXISTS` - the `FlashSale` with the specified ID does not
    ///                       exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "flashSale",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn flash_sale(
        id: api::sale::Id,
        ctx: &Context,
    ) -> Result<api::Sale, Error> {
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(query::sale::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| SaleError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns all the `FlashSale`s, regardless of their status, the most
    /// recently starting first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current user is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "flashSales",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn flash_sales(ctx: &Context) -> Result<Vec<api::Sale>, Error> {
        _ = ctx.admin_session().await?;

        ctx.service()
            .execute(query::sales::All::by(read::sale::All))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|sales| sales.into_iter().map(Into::into).collect())
    }
}

define_error! {
    enum SaleError {
        #[code = "SALE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`FlashSale` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum SaleItemError {
        #[code = "SALE_ITEM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`FlashSaleItem` with the specified ID does not exist"]
        NotExists,
    }
}
