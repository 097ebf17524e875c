//! [`Command`] for purchasing a single unit of a [`sale::Item`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        eligibility::{self, Reason, Snapshot},
        purchase,
        sale::{self, item},
        user, Eligibility, Purchase, Sale,
    },
    infra::{cache, database, Cache, Database},
    Service,
};

use super::Command;

/// [`Command`] for purchasing a single unit of a [`sale::Item`].
///
/// The whole purchase happens in a single transaction: the [`Eligibility`] is
/// evaluated on a consistent read, the unit is sold with a compare-and-swap,
/// and the [`Purchase`] is recorded. Losing a race to a concurrent purchase
/// results in [`ExecutionError::ConcurrentModification`], which is safe to
/// retry.
#[derive(Clone, Copy, Debug)]
pub struct PurchaseSaleItem {
    /// ID of the user making the purchase.
    pub user_id: user::Id,

    /// ID of the [`sale::Item`] to purchase.
    pub item_id: item::Id,
}

impl<Db, C> Command<PurchaseSaleItem> for Service<Db, C>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<sale::Item>, item::Id>>,
            Ok = Option<sale::Item>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Purchase>, (user::Id, item::Id)>>,
            Ok = Option<Purchase>,
            Err = Traced<database::Error>,
        > + Database<
            Update<item::Sell>,
            Ok = Option<sale::Item>,
            Err = Traced<database::Error>,
        > + Database<Insert<Purchase>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    type Ok = Purchase;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: PurchaseSaleItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PurchaseSaleItem { user_id, item_id } = cmd;

        let purchase = async {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let item = tx
                .execute(Select(By::<Option<sale::Item>, _>::new(item_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let sale = match &item {
                Some(i) => tx
                    .execute(Select(By::<Option<Sale>, _>::new(i.sale_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
                None => None,
            };
            let already_purchased = tx
                .execute(Select(By::<Option<Purchase>, _>::new((
                    user_id, item_id,
                ))))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some();

            let eligibility = Eligibility::evaluate_purchase(
                &Snapshot {
                    offer: sale.as_ref().zip(item.as_ref()),
                    already_purchased,
                },
                DateTime::now(),
            );
            if let Eligibility::Ineligible(reason) = eligibility {
                return Err(tracerr::new!(E::Ineligible(reason)));
            }
            let Some(item) = item else {
                return Err(tracerr::new!(E::Ineligible(Reason::ItemNotFound)));
            };

            let item = tx
                .execute(Update(item::Sell {
                    id: item.id,
                    expected: item.revision(),
                }))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::ConcurrentModification)
                .map_err(tracerr::wrap!())?;

            let purchase = Purchase {
                id: purchase::Id::new(),
                user_id,
                item_id: item.id,
                product_id: item.product_id,
                variant_id: item.variant_id,
                price: item.price,
                created_at: DateTime::now().coerce(),
            };
            let inserted = tx.execute(Insert(purchase.clone())).await;
            if let Err(e) = &inserted {
                // Concurrent purchase of the same user committed first.
                if e.as_ref().is_unique_violation(Some(
                    database::PURCHASE_PER_USER_CONSTRAINT,
                )) {
                    return Err(tracerr::new!(E::Ineligible(
                        Reason::AlreadyPurchased
                    )));
                }
            }
            inserted
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            Ok::<_, Traced<E>>(purchase)
        }
        .await
        .inspect_err(|e| {
            if let E::Db(err) = e.as_ref() {
                log::error!(
                    sale_item.id = %item_id,
                    user.id = %user_id,
                    "failed to purchase flash sale item: {err}",
                );
            }
        })?;

        self.invalidate_catalog().await;

        Ok(purchase)
    }
}

/// Error of [`PurchaseSaleItem`] [`Command`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// [`sale::Item`] was changed by a concurrent purchase in the meantime.
    #[display("Flash sale item was updated concurrently, please try again")]
    ConcurrentModification,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// User is not eligible to purchase the [`sale::Item`].
    #[display("{_0}")]
    Ineligible(#[error(not(source))] Reason),
}

impl ExecutionError {
    /// Returns the [`eligibility::Class`] of this [`ExecutionError`], if it's
    /// caused by a client rather than a failure.
    #[must_use]
    pub fn class(&self) -> Option<eligibility::Class> {
        match self {
            Self::ConcurrentModification => Some(eligibility::Class::Conflict),
            Self::Db(_) => None,
            Self::Ineligible(r) => Some(r.class()),
        }
    }
}

impl From<database::Error> for ExecutionError {
    fn from(e: database::Error) -> Self {
        if e.is_serialization_failure() {
            Self::ConcurrentModification
        } else {
            Self::Db(e)
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashSet, time::Duration};

    use common::{
        operations::{By, Select},
        DateTime, Money,
    };
    use futures::future;

    use crate::{
        command,
        domain::{
            eligibility::Reason,
            sale::{self, item},
            user, Purchase,
        },
        fixture::{self, TestService},
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, PurchaseSaleItem};

    async fn purchase(
        service: &TestService,
        user_id: user::Id,
        item_id: item::Id,
    ) -> Result<Purchase, ExecutionError> {
        service
            .execute(PurchaseSaleItem { user_id, item_id })
            .await
            .map_err(tracerr::Traced::into_inner)
    }

    /// Purchases, retrying on lost races.
    async fn purchase_with_retry(
        service: &TestService,
        user_id: user::Id,
        item_id: item::Id,
    ) -> Result<Purchase, ExecutionError> {
        loop {
            match purchase(service, user_id, item_id).await {
                Err(ExecutionError::ConcurrentModification) => {}
                res => return res,
            }
        }
    }

    fn assert_ineligible(res: Result<Purchase, ExecutionError>, reason: Reason) {
        match res {
            Err(ExecutionError::Ineligible(r)) => assert_eq!(r, reason),
            res => panic!("expected `{reason:?}`, got: {res:?}"),
        }
    }

    #[tokio::test]
    async fn sells_single_unit() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 5).await;
        let user_id = user::Id::new();

        let purchase = purchase(&service, user_id, item.id).await.unwrap();

        assert_eq!(purchase.user_id, user_id);
        assert_eq!(purchase.item_id, item.id);
        assert_eq!(purchase.product_id, item.product_id);
        assert_eq!(purchase.price, item.price);

        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(stored.sold_count, item::Quantity::new(1).unwrap());
        assert_eq!(stored.version, item.version.next());

        let recorded = service
            .database()
            .execute(Select(By::<Vec<Purchase>, _>::new(user_id)))
            .await
            .unwrap();
        assert_eq!(recorded, vec![purchase]);
    }

    #[tokio::test]
    async fn allows_single_purchase_per_user() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 5).await;
        let user_id = user::Id::new();

        drop(purchase(&service, user_id, item.id).await.unwrap());

        assert_ineligible(
            purchase(&service, user_id, item.id).await,
            Reason::AlreadyPurchased,
        );
        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(stored.sold_count, item::Quantity::new(1).unwrap());
    }

    #[tokio::test]
    async fn reports_sold_out() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 1).await;

        drop(purchase(&service, user::Id::new(), item.id).await.unwrap());

        assert_ineligible(
            purchase(&service, user::Id::new(), item.id).await,
            Reason::SoldOut,
        );
    }

    #[tokio::test]
    async fn reports_unknown_item() {
        let service = fixture::service();

        assert_ineligible(
            purchase(&service, user::Id::new(), item::Id::new()).await,
            Reason::ItemNotFound,
        );
    }

    #[tokio::test]
    async fn respects_sale_window_and_activation() {
        let service = fixture::service();
        let product_id = fixture::product(&service);

        for (starts_in, ends_in, is_active, reason) in [
            (None, None, false, Reason::NotActive),
            (Some(fixture::HOUR), Some(fixture::HOUR * 2), true, Reason::NotStarted),
        ] {
            let sale =
                fixture::sale(&service, starts_in, ends_in, is_active).await;
            let item =
                fixture::item(&service, sale.id, product_id, None, 100, 5).await;

            assert_ineligible(
                purchase(&service, user::Id::new(), item.id).await,
                reason,
            );
            let stored = fixture::stored_item(&service, item.id).await.unwrap();
            assert_eq!(stored.sold_count, item::Quantity::ZERO);
        }
    }

    #[tokio::test]
    async fn reports_ended_sale() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let mut sale = fixture::sale(&service, None, None, true).await;
        sale.end_time = (common::DateTime::now() - fixture::HOUR / 2).coerce();
        service
            .database()
            .execute(common::operations::Update(sale.clone()))
            .await
            .unwrap();
        let item =
            fixture::item(&service, sale.id, product_id, None, 100, 5).await;

        assert_ineligible(
            purchase(&service, user::Id::new(), item.id).await,
            Reason::Ended,
        );
    }

    #[tokio::test]
    async fn concurrent_purchases_never_oversell() {
        const STOCK: i32 = 5;
        const USERS: usize = 40;

        let service = fixture::service();
        let item = fixture::open_item(&service, STOCK).await;

        let results = future::join_all(
            (0..USERS).map(|_| purchase(&service, user::Id::new(), item.id)),
        )
        .await;

        let sold = results.iter().filter(|r| r.is_ok()).count();
        assert!(
            (1..=STOCK as usize).contains(&sold),
            "unexpected number of successes: {sold}",
        );
        for res in &results {
            if let Err(e) = res {
                assert!(
                    matches!(
                        e,
                        ExecutionError::ConcurrentModification
                            | ExecutionError::Ineligible(Reason::SoldOut),
                    ),
                    "unexpected error: {e}",
                );
            }
        }

        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(
            stored.sold_count,
            item::Quantity::new(sold.try_into().unwrap()).unwrap(),
        );
    }

    #[tokio::test]
    async fn retried_purchases_sell_exactly_stock() {
        const STOCK: i32 = 5;
        const USERS: usize = 20;

        let service = fixture::service();
        let item = fixture::open_item(&service, STOCK).await;

        let results = future::join_all(
            (0..USERS)
                .map(|_| purchase_with_retry(&service, user::Id::new(), item.id)),
        )
        .await;

        let buyers = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|p| p.user_id)
            .collect::<HashSet<_>>();
        assert_eq!(buyers.len(), STOCK as usize);
        let sold_out = results
            .iter()
            .filter(|r| {
                matches!(r, Err(ExecutionError::Ineligible(Reason::SoldOut)))
            })
            .count();
        assert_eq!(sold_out, USERS - STOCK as usize);

        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(stored.sold_count, stored.max_quantity);
        assert!(stored.is_sold_out());
    }

    #[tokio::test]
    async fn double_submit_by_same_user_buys_once() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 5).await;
        let user_id = user::Id::new();

        let (first, second) = future::join(
            purchase_with_retry(&service, user_id, item.id),
            purchase_with_retry(&service, user_id, item.id),
        )
        .await;

        let (ok, err) = match (first, second) {
            (Ok(p), Err(e)) | (Err(e), Ok(p)) => (p, e),
            res => panic!("expected single success, got: {res:?}"),
        };
        assert_eq!(ok.user_id, user_id);
        assert!(matches!(
            err,
            ExecutionError::Ineligible(Reason::AlreadyPurchased),
        ));
        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(stored.sold_count, item::Quantity::new(1).unwrap());
    }

    #[tokio::test]
    async fn buyer_of_sold_out_item_is_told_already_purchased() {
        let service = fixture::service();
        let product_id = fixture::product(&service);
        let now = DateTime::now();
        let sale = service
            .execute(command::CreateSale {
                name: sale::Name::new("Midnight deal").unwrap(),
                start_time: (now - Duration::from_secs(60)).coerce(),
                end_time: (now + Duration::from_secs(600)).coerce(),
                is_active: None,
            })
            .await
            .unwrap();
        let item = service
            .execute(command::AddSaleItem {
                sale_id: sale.id,
                product_id,
                variant_id: None,
                price: Money::from_cents(5000).unwrap(),
                max_quantity: item::Quantity::new(1).unwrap(),
            })
            .await
            .unwrap();
        let (first, second) = (user::Id::new(), user::Id::new());

        let bought = purchase(&service, first, item.id).await.unwrap();
        assert_eq!(bought.price, Money::from_cents(5000).unwrap());
        let stored = fixture::stored_item(&service, item.id).await.unwrap();
        assert_eq!(stored.remaining_quantity(), item::Quantity::ZERO);

        let res = purchase(&service, second, item.id).await;
        assert_eq!(res.as_ref().unwrap_err().to_string(), "Sold out");
        assert_ineligible(res, Reason::SoldOut);

        for _ in 0..2 {
            let res = purchase(&service, first, item.id).await;
            assert_eq!(
                res.as_ref().unwrap_err().to_string(),
                "Already purchased",
            );
            assert_ineligible(res, Reason::AlreadyPurchased);
        }
    }

    #[test]
    fn lost_race_asks_to_try_again() {
        assert_eq!(
            ExecutionError::ConcurrentModification.to_string(),
            "Flash sale item was updated concurrently, please try again",
        );
    }
}
