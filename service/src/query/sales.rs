//! [`Query`] collection related to multiple [`Sale`]s.

use common::{
    operations::{By, Delete, Insert, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::Sale,
    infra::{cache, database, Cache, Database},
    read, Service,
};

use super::{DatabaseQuery, Query};

/// Queries all the [`Sale`]s, the most recently starting first.
pub type All = DatabaseQuery<By<Vec<Sale>, read::sale::All>>;

/// [`Query`] of the [`Sale`]s open for purchases right now, along with their
/// [`sale::Item`]s.
///
/// Served from the [`Cache`] when possible, so may lag behind the
/// [`Database`] for up to the configured TTL.
///
/// [`sale::Item`]: crate::domain::sale::Item
#[derive(Clone, Copy, Debug, Default)]
pub struct Active;

impl<Db, C> Query<Active> for Service<Db, C>
where
    Db: Database<
        Select<By<Vec<read::sale::Listing>, read::sale::Open>>,
        Ok = Vec<read::sale::Listing>,
        Err = Traced<database::Error>,
    >,
    C: Cache<
            Select<By<Option<Vec<read::sale::Listing>>, cache::Key>>,
            Ok = Option<Vec<read::sale::Listing>>,
            Err = Traced<cache::Error>,
        > + Cache<
            Insert<cache::Entry<Vec<read::sale::Listing>>>,
            Err = Traced<cache::Error>,
        > + Cache<
            Select<By<Option<cache::Epoch>, cache::Key>>,
            Ok = Option<cache::Epoch>,
            Err = Traced<cache::Error>,
        > + Cache<Delete<cache::Key>, Err = Traced<cache::Error>>,
{
    type Ok = Vec<read::sale::Listing>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Active) -> Result<Self::Ok, Self::Err> {
        self.read_through(
            cache::Key::active_sales(),
            self.database().execute(Select(
                By::<Vec<read::sale::Listing>, _>::new(read::sale::Open(
                    DateTime::now(),
                )),
            )),
        )
        .await
    }
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command,
        domain::{sale::item, user},
        fixture,
        infra::cache,
        Command as _, Query as _,
    };

    use super::{Active, All};

    #[tokio::test]
    async fn lists_only_open_sales_with_items() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let open = fixture::sale(&service, None, None, true).await;
        let disabled = fixture::sale(&service, None, None, false).await;
        let upcoming = fixture::sale(
            &service,
            Some(fixture::HOUR),
            Some(fixture::HOUR * 2),
            true,
        )
        .await;
        let item =
            fixture::item(&service, open.id, product_id, None, 100, 3).await;

        let listings = service.execute(Active).await.unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].sale, open);
        assert_eq!(listings[0].items, vec![item]);

        let all = service.execute(All::by(crate::read::sale::All)).await.unwrap();
        assert_eq!(all.len(), 3);
        for sale in [&open, &disabled, &upcoming] {
            assert!(all.contains(sale));
        }
    }

    #[tokio::test]
    async fn serves_cached_listings_until_invalidated() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let sale = fixture::sale(&service, None, None, true).await;

        assert!(service.execute(Active).await.unwrap()[0].items.is_empty());
        assert!(service.cache().contains(&cache::Key::active_sales()));

        // Written behind the cache's back, so not visible yet.
        drop(fixture::item(&service, sale.id, product_id, None, 100, 3).await);
        assert!(service.execute(Active).await.unwrap()[0].items.is_empty());

        let item = service
            .execute(command::AddSaleItem {
                sale_id: sale.id,
                product_id,
                variant_id: None,
                price: Money::from_cents(200).unwrap(),
                max_quantity: item::Quantity::new(1).unwrap(),
            })
            .await
            .unwrap();
        let listings = service.execute(Active).await.unwrap();
        assert_eq!(listings[0].items.len(), 2);

        drop(
            service
                .execute(command::PurchaseSaleItem {
                    user_id: user::Id::new(),
                    item_id: item.id,
                })
                .await
                .unwrap(),
        );
        let listings = service.execute(Active).await.unwrap();
        let sold = listings[0].items.iter().find(|i| i.id == item.id).unwrap();
        assert!(sold.is_sold_out());
    }

    #[tokio::test]
    async fn falls_back_to_database_when_cache_is_unavailable() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;
        service.cache().set_unavailable(true);

        let listings = service.execute(Active).await.unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].sale, sale);
    }
}
