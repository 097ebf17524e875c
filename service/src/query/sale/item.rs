//! [`Query`] collection related to a single [`sale::Item`].

use common::{
    operations::{By, Select},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{
        eligibility::Snapshot,
        sale::{self, item},
        user, Eligibility as Evaluated, Purchase, Sale,
    },
    infra::{database, Database},
    query::{DatabaseQuery, Query},
    Service,
};

/// Queries a [`sale::Item`] by its [`item::Id`].
pub type ById = DatabaseQuery<By<Option<sale::Item>, item::Id>>;

/// [`Query`] evaluating whether a user may purchase a [`sale::Item`] right
/// now.
///
/// Always reads the [`Database`], so the result reflects the latest stock.
/// It's still a hint only: a purchase made afterwards may fail anyway.
#[derive(Clone, Copy, Debug)]
pub struct Eligibility {
    /// ID of the user to check.
    pub user_id: user::Id,

    /// ID of the [`sale::Item`] to check.
    pub item_id: item::Id,
}

impl<Db, C> Query<Eligibility> for Service<Db, C>
where
    Db: Database<
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
        >,
{
    type Ok = Evaluated;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Eligibility { user_id, item_id }: Eligibility,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(item) = self
            .database()
            .execute(Select(By::<Option<sale::Item>, _>::new(item_id)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(Evaluated::evaluate(
                &Snapshot {
                    offer: None,
                    already_purchased: false,
                },
                DateTime::now(),
            ));
        };

        let sale = self
            .database()
            .execute(Select(By::<Option<Sale>, _>::new(item.sale_id)))
            .await
            .map_err(tracerr::wrap!())?;
        let already_purchased = self
            .database()
            .execute(Select(By::<Option<Purchase>, _>::new((user_id, item_id))))
            .await
            .map_err(tracerr::wrap!())?
            .is_some();

        Ok(Evaluated::evaluate(
            &Snapshot {
                offer: sale.as_ref().map(|s| (s, &item)),
                already_purchased,
            },
            DateTime::now(),
        ))
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command,
        domain::{eligibility::Reason, sale::item, user, Eligibility as Evaluated},
        fixture, Command as _, Query as _,
    };

    use super::{ById, Eligibility};

    #[tokio::test]
    async fn reports_remaining_quantity() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 3).await;

        let eligibility = service
            .execute(Eligibility {
                user_id: user::Id::new(),
                item_id: item.id,
            })
            .await
            .unwrap();

        assert_eq!(
            eligibility,
            Evaluated::Eligible {
                item_id: item.id,
                price: item.price,
                remaining_quantity: item::Quantity::new(3).unwrap(),
            },
        );
    }

    #[tokio::test]
    async fn reflects_purchases_immediately() {
        let service = fixture::service();
        let item = fixture::open_item(&service, 2).await;
        let buyer = user::Id::new();
        drop(
            service
                .execute(command::PurchaseSaleItem {
                    user_id: buyer,
                    item_id: item.id,
                })
                .await
                .unwrap(),
        );

        let for_buyer = service
            .execute(Eligibility {
                user_id: buyer,
                item_id: item.id,
            })
            .await
            .unwrap();
        assert_eq!(for_buyer.reason(), Some(Reason::AlreadyPurchased));

        let for_other = service
            .execute(Eligibility {
                user_id: user::Id::new(),
                item_id: item.id,
            })
            .await
            .unwrap();
        assert_eq!(
            for_other.remaining_quantity(),
            Some(item::Quantity::new(1).unwrap()),
        );

        let stored = service.execute(ById::by(item.id)).await.unwrap().unwrap();
        assert_eq!(stored.sold_count, item::Quantity::new(1).unwrap());
    }

    #[tokio::test]
    async fn reports_unknown_item() {
        let service = fixture::service();

        let eligibility = service
            .execute(Eligibility {
                user_id: user::Id::new(),
                item_id: item::Id::new(),
            })
            .await
            .unwrap();

        assert_eq!(eligibility.reason(), Some(Reason::ItemNotFound));
        assert_eq!(eligibility.remaining_quantity(), None);
    }
}
