//! [`Command`] for adding a new [`sale::Item`] to a [`Sale`].

use common::{
    operations::{By, Delete, Insert, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        product,
        sale::{self, item},
        Sale,
    },
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for adding a new [`sale::Item`] to a [`Sale`].
#[derive(Clone, Copy, Debug)]
pub struct AddSaleItem {
    /// ID of the [`Sale`] to add the [`sale::Item`] to.
    pub sale_id: sale::Id,

    /// ID of the offered catalog product.
    pub product_id: product::Id,

    /// ID of the offered variant of the catalog product, if the offer is
    /// restricted to it.
    pub variant_id: Option<product::VariantId>,

    /// Price of a single unit during the [`Sale`].
    pub price: Money,

    /// Number of units to be sold.
    pub max_quantity: item::Quantity,
}

impl<Db, C> Command<AddSaleItem> for Service<Db, C>
where
    Db: Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<read::product::Product>, product::Id>>,
            Ok = Option<read::product::Product>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<read::product::Variant>, product::VariantId>>,
            Ok = Option<read::product::Variant>,
            Err = Traced<database::Error>,
        > + Database<Insert<sale::Item>, Err = Traced<database::Error>>,
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    type Ok = sale::Item;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AddSaleItem) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddSaleItem {
            sale_id,
            product_id,
            variant_id,
            price,
            max_quantity,
        } = cmd;

        if max_quantity.is_zero() {
            return Err(tracerr::new!(E::ZeroMaxQuantity));
        }

        self.database()
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Select(By::<Option<read::product::Product>, _>::new(
                product_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ProductNotExists(product_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if let Some(variant_id) = variant_id {
            let variant = self
                .database()
                .execute(Select(
                    By::<Option<read::product::Variant>, _>::new(variant_id),
                ))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::VariantNotExists(variant_id))
                .map_err(tracerr::wrap!())?;
            if variant.product_id != product_id {
                return Err(tracerr::new!(E::VariantNotOfProduct {
                    variant_id,
                    product_id,
                }));
            }
        }

        let item = sale::Item {
            id: item::Id::new(),
            sale_id,
            product_id,
            variant_id,
            price,
            max_quantity,
            sold_count: item::Quantity::ZERO,
            version: item::Version::INITIAL,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(item.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.invalidate_catalog().await;

        Ok(item)
    }
}

/// Error of [`AddSaleItem`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Catalog product with the provided ID does not exist.
    #[display("`Product(id: {_0})` does not exist")]
    #[from(ignore)]
    ProductNotExists(#[error(not(source))] product::Id),

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    #[from(ignore)]
    SaleNotExists(#[error(not(source))] sale::Id),

    /// Catalog product variant with the provided ID does not exist.
    #[display("`ProductVariant(id: {_0})` does not exist")]
    #[from(ignore)]
    VariantNotExists(#[error(not(source))] product::VariantId),

    /// Catalog product variant belongs to another product.
    #[display(
        "`ProductVariant(id: {variant_id})` is not a variant of \
         `Product(id: {product_id})`"
    )]
    #[from(ignore)]
    VariantNotOfProduct {
        /// ID of the catalog product variant.
        variant_id: product::VariantId,

        /// ID of the catalog product.
        product_id: product::Id,
    },

    /// Maximum quantity of a [`sale::Item`] is zero.
    #[display("`max_quantity` must be positive")]
    #[from(ignore)]
    ZeroMaxQuantity,
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        domain::{product, sale::item},
        fixture, query, Command as _, Query as _,
    };

    use super::{AddSaleItem, ExecutionError};

    #[tokio::test]
    async fn adds_fresh_item() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let variant_id = fixture::variant(&service, product_id);
        let sale = fixture::sale(&service, None, None, true).await;

        let item = service
            .execute(AddSaleItem {
                sale_id: sale.id,
                product_id,
                variant_id: Some(variant_id),
                price: Money::from_cents(4_999).unwrap(),
                max_quantity: item::Quantity::new(10).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(item.sold_count, item::Quantity::ZERO);
        assert_eq!(item.version, item::Version::INITIAL);
        assert_eq!(item.remaining_quantity(), item::Quantity::new(10).unwrap());
        assert_eq!(
            fixture::stored_item(&service, item.id).await,
            Some(item),
        );
    }

    #[tokio::test]
    async fn rejects_invalid_references() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let other_product_id = fixture::product(&service);
        let foreign_variant_id = fixture::variant(&service, other_product_id);
        let sale = fixture::sale(&service, None, None, true).await;
        let cmd = AddSaleItem {
            sale_id: sale.id,
            product_id,
            variant_id: None,
            price: Money::from_cents(100).unwrap(),
            max_quantity: item::Quantity::new(1).unwrap(),
        };

        let err = service
            .execute(AddSaleItem {
                sale_id: crate::domain::sale::Id::new(),
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::SaleNotExists(_)));

        let err = service
            .execute(AddSaleItem {
                product_id: product::Id::new(),
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ProductNotExists(_)));

        let err = service
            .execute(AddSaleItem {
                variant_id: Some(product::VariantId::new()),
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::VariantNotExists(_)));

        let err = service
            .execute(AddSaleItem {
                variant_id: Some(foreign_variant_id),
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::VariantNotOfProduct { .. },
        ));

        let err = service
            .execute(AddSaleItem {
                max_quantity: item::Quantity::ZERO,
                ..cmd
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ZeroMaxQuantity));

        assert!(service
            .execute(query::sale::Items::by(sale.id))
            .await
            .unwrap()
            .is_empty());
    }
}
