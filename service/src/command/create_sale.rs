//! [`Command`] for creating a new [`Sale`].

use common::{
    operations::{Delete, Insert},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{cache, database, Cache, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Sale`].
#[derive(Clone, Debug)]
pub struct CreateSale {
    /// [`sale::Name`] of the new [`Sale`].
    pub name: sale::Name,

    /// [`DateTime`] when the new [`Sale`] starts.
    pub start_time: sale::StartDateTime,

    /// [`DateTime`] when the new [`Sale`] ends.
    pub end_time: sale::EndDateTime,

    /// Indicator whether the new [`Sale`] is enabled.
    ///
    /// Enabled if omitted.
    pub is_active: Option<bool>,
}

impl<Db, C> Command<CreateSale> for Service<Db, C>
where
    Db: Database<Insert<Sale>, Err = Traced<database::Error>>,
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateSale {
            name,
            start_time,
            end_time,
            is_active,
        } = cmd;

        if !Sale::is_valid_window(start_time, end_time) {
            return Err(tracerr::new!(E::InvalidTimeWindow));
        }

        let sale = Sale {
            id: sale::Id::new(),
            name,
            start_time,
            end_time,
            is_active: is_active.unwrap_or(true),
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.invalidate_catalog().await;

        Ok(sale)
    }
}

/// Error of [`CreateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Sale`] doesn't end strictly after it starts.
    #[display("`end_time` must be after `start_time`")]
    #[from(ignore)]
    InvalidTimeWindow,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{sale, Sale},
        fixture,
        infra::{cache, Database as _},
        Command as _,
    };

    use super::{CreateSale, ExecutionError};

    fn command(starts_in_hours: u32, ends_in_hours: u32) -> CreateSale {
        let now = common::DateTime::now();
        CreateSale {
            name: sale::Name::new("Summer sale").unwrap(),
            start_time: (now + fixture::HOUR * starts_in_hours).coerce(),
            end_time: (now + fixture::HOUR * ends_in_hours).coerce(),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn stores_enabled_sale() {
        let service = fixture::service();

        let sale = service.execute(command(1, 2)).await.unwrap();

        assert!(sale.is_active);
        let stored = service
            .database()
            .execute(Select(By::<Option<Sale>, _>::new(sale.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(sale));
    }

    #[tokio::test]
    async fn keeps_explicit_activation() {
        let service = fixture::service();

        let sale = service
            .execute(CreateSale {
                is_active: Some(false),
                ..command(1, 2)
            })
            .await
            .unwrap();

        assert!(!sale.is_active);
    }

    #[tokio::test]
    async fn rejects_inverted_or_empty_window() {
        let service = fixture::service();

        for (start, end) in [(2, 1), (1, 1)] {
            let err = service.execute(command(start, end)).await.unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::InvalidTimeWindow),
                "unexpected error: {err}",
            );
        }
    }

    #[tokio::test]
    async fn invalidates_catalog() {
        let service = fixture::service();
        let key = cache::Key::active_sales();
        service
            .cache()
            .execute(common::operations::Insert(cache::Entry {
                key: key.clone(),
                value: Vec::<Sale>::new(),
                ttl: fixture::HOUR,
            }))
            .await
            .unwrap();
        assert!(service.cache().contains(&key));

        drop(service.execute(command(1, 2)).await.unwrap());

        assert!(!service.cache().contains(&key));
    }
}
