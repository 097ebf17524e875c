//! [`Query`] collection related to a single [`Sale`].

pub mod item;

use common::{
    operations::{By, Delete, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{product, sale, Sale},
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Sale`] by its [`sale::Id`].
pub type ById = DatabaseQuery<By<Option<Sale>, sale::Id>>;

/// Queries [`sale::Item`]s of a [`Sale`] by its [`sale::Id`], in the order
/// they were added.
pub type Items = DatabaseQuery<By<Vec<sale::Item>, sale::Id>>;

/// [`Query`] of the [`read::sale::Offer`] currently available for a product.
///
/// Absence of an [`read::sale::Offer`] is [`Cache`]d too.
#[derive(Clone, Copy, Debug)]
pub struct ForProduct {
    /// ID of the product.
    pub product_id: product::Id,

    /// ID of the product variant, if a specific one is requested.
    pub variant_id: Option<product::VariantId>,
}

impl<Db, C> Query<ForProduct> for Service<Db, C>
where
    Db: Database<
        Select<By<Option<read::sale::Offer>, read::sale::offer::Selector>>,
        Ok = Option<read::sale::Offer>,
        Err = Traced<database::Error>,
    >,
    C: Cache<
            Select<By<Option<Option<read::sale::Offer>>, cache::Key>>,
            Ok = Option<Option<read::sale::Offer>>,
            Err = Traced<cache::Error>,
        > + Cache<
            Insert<cache::Entry<Option<read::sale::Offer>>>,
            Err = Traced<cache::Error>,
        > + Cache<
            Select<By<Option<cache::Epoch>, cache::Key>>,
            Ok = Option<cache::Epoch>,
            Err = Traced<cache::Error>,
        > + Cache<Delete<cache::Key>, Err = Traced<cache::Error>>,
{
    type Ok = Option<read::sale::Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ForProduct {
            product_id,
            variant_id,
        }: ForProduct,
    ) -> Result<Self::Ok, Self::Err> {
        self.read_through(
            cache::Key::sale_for_product(product_id, variant_id),
            self.database().execute(Select(By::<
                Option<read::sale::Offer>,
                _,
            >::new(
                read::sale::offer::Selector {
                    product_id,
                    variant_id,
                    at: DateTime::now(),
                },
            ))),
        )
        .await
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command,
        domain::{product, sale, user},
        fixture,
        infra::cache,
        Command as _, Query as _,
    };

    use super::{ById, ForProduct, Items};

    #[tokio::test]
    async fn reads_sale_with_items() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 2).await;

        let sale = service
            .execute(ById::by(item.sale_id))
            .await
            .unwrap()
            .unwrap();
        let items = service.execute(Items::by(sale.id)).await.unwrap();

        assert_eq!(items, vec![item]);
        assert_eq!(
            service.execute(ById::by(sale::Id::new())).await.unwrap(),
            None,
        );
    }

    #[tokio::test]
    async fn prefers_exact_variant_then_cheapest() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let variant_id = fixture::variant(&service, product_id);
        let other_variant_id = fixture::variant(&service, product_id);
        let sale = fixture::sale(&service, None, None, true).await;
        let cheap_wide =
            fixture::item(&service, sale.id, product_id, None, 300, 5).await;
        drop(fixture::item(&service, sale.id, product_id, None, 400, 5).await);
        let exact = fixture::item(
            &service,
            sale.id,
            product_id,
            Some(variant_id),
            500,
            5,
        )
        .await;

        let offer = |variant_id| {
            service.execute(ForProduct {
                product_id,
                variant_id,
            })
        };

        let exact_offer = offer(Some(variant_id)).await.unwrap().unwrap();
        assert_eq!(exact_offer.item, exact);
        assert_eq!(exact_offer.sale, sale);

        let fallback = offer(Some(other_variant_id)).await.unwrap().unwrap();
        assert_eq!(fallback.item, cheap_wide);

        let wide = offer(None).await.unwrap().unwrap();
        assert_eq!(wide.item, cheap_wide);
    }

    #[tokio::test]
    async fn caches_absent_offer() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let key = cache::Key::sale_for_product(product_id, None);
        let query = ForProduct {
            product_id,
            variant_id: None,
        };

        assert_eq!(service.execute(query).await.unwrap(), None);
        assert!(service.cache().contains(&key));

        // Catalog changes made through commands drop the cached absence.
        let sale = fixture::sale(&service, None, None, true).await;
        drop(
            service
                .execute(command::AddSaleItem {
                    sale_id: sale.id,
                    product_id,
                    variant_id: None,
                    price: common::Money::from_cents(100).unwrap(),
                    max_quantity: sale::item::Quantity::new(1).unwrap(),
                })
                .await
                .unwrap(),
        );
        assert!(!service.cache().contains(&key));
        assert!(service.execute(query).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ignores_closed_sales() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let closed = fixture::sale(&service, None, None, false).await;
        drop(fixture::item(&service, closed.id, product_id, None, 100, 5).await);

        let offer = service
            .execute(ForProduct {
                product_id,
                variant_id: Some(product::VariantId::new()),
            })
            .await
            .unwrap();

        assert_eq!(offer, None);
    }

    #[tokio::test]
    async fn reflects_purchase_in_offer() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 3).await;
        let query = ForProduct {
            product_id: item.product_id,
            variant_id: None,
        };

        let before = service.execute(query).await.unwrap().unwrap();
        assert_eq!(
            before.item.remaining_quantity(),
            sale::item::Quantity::new(3).unwrap(),
        );

        drop(
            service
                .execute(command::PurchaseSaleItem {
                    user_id: user::Id::new(),
                    item_id: item.id,
                })
                .await
                .unwrap(),
        );

        let after = service.execute(query).await.unwrap().unwrap();
        assert_eq!(
            after.item.remaining_quantity(),
            sale::item::Quantity::new(2).unwrap(),
        );
    }
}
