//! [`Sale`]-related definitions.

pub mod item;

use common::{DateTime, Handler as _};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLScalar, InputValue, ScalarValue, Value,
};
use service::{domain, query, read};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

pub use self::item::Item;

/// A flash sale.
#[derive(Clone, Debug)]
pub struct Sale {
    /// Underlying [`domain::Sale`].
    sale: domain::Sale,

    /// [`domain::SaleItem`]s of this [`Sale`], loaded lazily unless known
    /// upfront.
    items: OnceCell<Vec<domain::SaleItem>>,
}

impl From<domain::Sale> for Sale {
    fn from(sale: domain::Sale) -> Self {
        Self {
            sale,
            items: OnceCell::new(),
        }
    }
}

impl From<read::sale::Listing> for Sale {
    fn from(listing: read::sale::Listing) -> Self {
        Self {
            sale: listing.sale,
            items: OnceCell::new_with(Some(listing.items)),
        }
    }
}

impl Sale {
    /// Returns the [`domain::SaleItem`]s of this [`Sale`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::SaleItem`]s cannot be loaded.
    async fn load_items(
        &self,
        ctx: &Context,
    ) -> Result<&[domain::SaleItem], Error> {
        let id = self.sale.id;
        self.items
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::sale::Items::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
            .map(Vec::as_slice)
    }
}

/// A flash sale: a time-boxed event offering a limited quantity of catalog
/// products at discounted prices.
#[graphql_object(name = "FlashSale", context = Context)]
impl Sale {
    /// Unique identifier of this `FlashSale`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.sale.id.into()
    }

    /// Name of this `FlashSale`.
    #[must_use]
    pub fn name(&self) -> Name {
        self.sale.name.clone().into()
    }

    /// `DateTime` when this `FlashSale` starts (inclusive).
    #[must_use]
    pub fn start_time(&self) -> DateTime {
        self.sale.start_time.coerce()
    }

    /// `DateTime` when this `FlashSale` ends (inclusive).
    #[must_use]
    pub fn end_time(&self) -> DateTime {
        self.sale.end_time.coerce()
    }

    /// Indicator whether this `FlashSale` is enabled by an administrator.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.sale.is_active
    }

    /// Effective status of this `FlashSale` at the moment of the request.
    #[must_use]
    pub fn status(&self) -> Status {
        self.sale.status(DateTime::now()).into()
    }

    /// `DateTime` when this `FlashSale` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.sale.created_at.coerce()
    }

    /// Items offered by this `FlashSale`, in the order they were added.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "FlashSale.items",
            otel.name = api::Query::SPAN_NAME,
            sale.id = %self.sale.id,
        ),
    )]
    pub async fn items(&self, ctx: &Context) -> Result<Vec<Item>, Error> {
        Ok(self
            .load_items(ctx)
            .await?
            .iter()
            .cloned()
            .map(Into::into)
            .collect())
    }
}

/// Unique identifier of a `FlashSale`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::sale::Id)]
#[into(domain::sale::Id)]
#[graphql(name = "FlashSaleId", transparent)]
pub struct Id(Uuid);

/// Name of a `FlashSale`: trimmed, non-empty and at most 512 bytes long.
#[derive(Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "FlashSaleName",
    to_output_with = Self::to_output,
    from_input_with = Self::from_input,
    parse_token(String),
)]
pub struct Name(domain::sale::Name);

impl Name {
    fn to_output<S: ScalarValue>(name: &Self) -> Value<S> {
        Value::scalar(name.0.to_string())
    }

    fn from_input<S: ScalarValue>(input: &InputValue<S>) -> Result<Self, String> {
        let s = input.as_string_value().ok_or_else(|| {
            format!(
                "Cannot parse `FlashSaleName` input scalar from non-string \
                 value: {input}",
            )
        })?;
        s.parse::<domain::sale::Name>().map(Self).map_err(|e| {
            format!("Cannot parse `FlashSaleName` input scalar: {e}")
        })
    }
}

/// Effective status of a `FlashSale`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "FlashSaleStatus")]
pub enum Status {
    /// `FlashSale` is enabled, but hasn't started yet.
    NotStarted,

    /// `FlashSale` is enabled and accepts purchases.
    Active,

    /// `FlashSale` is over.
    Ended,

    /// `FlashSale` is disabled by an administrator.
    Inactive,
}

impl From<domain::sale::Status> for Status {
    fn from(status: domain::sale::Status) -> Self {
        use domain::sale::Status as S;
        match status {
            S::NotStarted => Self::NotStarted,
            S::Active => Self::Active,
            S::Ended => Self::Ended,
            S::Inactive => Self::Inactive,
        }
    }
}

/// Flash sale offer currently available for a catalog product.
#[derive(Clone, Debug)]
pub struct Offer {
    /// [`Sale`] the offer belongs to.
    sale: Sale,

    /// Offered [`Item`].
    item: Item,
}

impl From<read::sale::Offer> for Offer {
    fn from(offer: read::sale::Offer) -> Self {
        Self {
            sale: offer.sale.into(),
            item: offer.item.into(),
        }
    }
}

/// Flash sale offer currently available for a catalog product.
#[graphql_object(name = "FlashSaleOffer", context = Context)]
impl Offer {
    /// `FlashSale` the offer belongs to.
    #[must_use]
    pub fn sale(&self) -> Sale {
        self.sale.clone()
    }

    /// Offered `FlashSaleItem`.
    #[must_use]
    pub fn item(&self) -> Item {
        self.item.clone()
    }
}
