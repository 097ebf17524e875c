//! [`Query`] collection related to multiple [`Purchase`]s.

use common::operations::By;

use crate::domain::{user, Purchase};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Purchase`]s of a user by its [`user::Id`], the most recent first.
pub type ByUser = DatabaseQuery<By<Vec<Purchase>, user::Id>>;

#[cfg(test)]
mod spec {
    use crate::{command, domain::user, fixture, Command as _, Query as _};

    use super::ByUser;

    #[tokio::test]
    async fn lists_only_own_purchases() {
        let service = fixture::service();
        let first = fixture::open_item(&service, 5).await;
        let second = fixture::open_item(&service, 5).await;
        let user_id = user::Id::new();
        for item_id in [first.id, second.id] {
            drop(
                service
                    .execute(command::PurchaseSaleItem { user_id, item_id })
                    .await
                    .unwrap(),
            );
        }
        drop(
            service
                .execute(command::PurchaseSaleItem {
                    user_id: user::Id::new(),
                    item_id: first.id,
                })
                .await
                .unwrap(),
        );

        let purchases = service.execute(ByUser::by(user_id)).await.unwrap();

        assert_eq!(purchases.len(), 2);
        assert!(purchases.iter().all(|p| p.user_id == user_id));
        assert!(purchases[0].created_at >= purchases[1].created_at);
    }
}
