//! [`Command`] for updating an existing [`Sale`].

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{cache, database, Cache, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating an existing [`Sale`].
///
/// Only the provided fields are changed. Changing any bound of the time window
/// requires the resulting window to stay valid, even when the other bound is
/// the stored one.
#[derive(Clone, Debug)]
pub struct UpdateSale {
    /// ID of the [`Sale`] to update.
    pub sale_id: sale::Id,

    /// New [`sale::Name`] of the [`Sale`].
    pub name: Option<sale::Name>,

    /// New [`DateTime`] when the [`Sale`] starts.
    ///
    /// [`DateTime`]: common::DateTime
    pub start_time: Option<sale::StartDateTime>,

    /// New [`DateTime`] when the [`Sale`] ends.
    ///
    /// [`DateTime`]: common::DateTime
    pub end_time: Option<sale::EndDateTime>,

    /// New activation state of the [`Sale`].
    pub is_active: Option<bool>,
}

impl<Db, C> Command<UpdateSale> for Service<Db, C>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Sale, sale::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Sale>, sale::Id>>,
            Ok = Option<Sale>,
            Err = Traced<database::Error>,
        > + Database<Update<Sale>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    type Ok = Sale;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateSale) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateSale {
            sale_id,
            name,
            start_time,
            end_time,
            is_active,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid lost updates of concurrent edits.
        tx.execute(Lock(By::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut sale = tx
            .execute(Select(By::<Option<Sale>, _>::new(sale_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::SaleNotExists(sale_id))
            .map_err(tracerr::wrap!())?;

        if let Some(name) = name {
            sale.name = name;
        }
        if let Some(start_time) = start_time {
            sale.start_time = start_time;
        }
        if let Some(end_time) = end_time {
            sale.end_time = end_time;
        }
        if let Some(is_active) = is_active {
            sale.is_active = is_active;
        }
        // The merged window is checked whenever any of its bounds changes.
        if (start_time.is_some() || end_time.is_some())
            && !Sale::is_valid_window(sale.start_time, sale.end_time)
        {
            return Err(tracerr::new!(E::InvalidTimeWindow));
        }

        tx.execute(Update(sale.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.invalidate_catalog().await;

        Ok(sale)
    }
}

/// Error of [`UpdateSale`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Sale`] doesn't end strictly after it starts.
    #[display("`end_time` must be after `start_time`")]
    #[from(ignore)]
    InvalidTimeWindow,

    /// [`Sale`] with the provided ID does not exist.
    #[display("`Sale(id: {_0})` does not exist")]
    #[from(ignore)]
    SaleNotExists(#[error(not(source))] sale::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        domain::{sale, Sale},
        fixture,
        fixture::TestService,
        query, Command as _, Query as _,
    };

    use super::{ExecutionError, UpdateSale};

    async fn stored(service: &TestService, id: sale::Id) -> Sale {
        service
            .execute(query::sale::ById::by(id))
            .await
            .unwrap()
            .unwrap()
    }

    fn noop(sale_id: sale::Id) -> UpdateSale {
        UpdateSale {
            sale_id,
            name: None,
            start_time: None,
            end_time: None,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn changes_only_provided_fields() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;

        let updated = service
            .execute(UpdateSale {
                name: Some(sale::Name::new("Cyber Monday").unwrap()),
                is_active: Some(false),
                ..noop(sale.id)
            })
            .await
            .unwrap();

        assert_eq!(AsRef::<str>::as_ref(&updated.name), "Cyber Monday");
        assert!(!updated.is_active);
        assert_eq!(updated.start_time, sale.start_time);
        assert_eq!(updated.end_time, sale.end_time);
        assert_eq!(updated.created_at, sale.created_at);
    }

    #[tokio::test]
    async fn rejects_invalid_window_when_both_bounds_provided() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;
        let now = DateTime::now();

        let err = service
            .execute(UpdateSale {
                start_time: Some((now + fixture::HOUR).coerce()),
                end_time: Some(now.coerce()),
                ..noop(sale.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidTimeWindow));
        assert_eq!(stored(&service, sale.id).await, sale);
    }

    #[tokio::test]
    async fn rejects_end_before_stored_start() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;

        let err = service
            .execute(UpdateSale {
                end_time: Some((sale.start_time - fixture::HOUR).coerce()),
                ..noop(sale.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidTimeWindow));
        assert_eq!(stored(&service, sale.id).await, sale);
    }

    #[tokio::test]
    async fn rejects_start_after_stored_end() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;

        let err = service
            .execute(UpdateSale {
                start_time: Some((sale.end_time + fixture::HOUR).coerce()),
                ..noop(sale.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidTimeWindow));
        assert_eq!(stored(&service, sale.id).await, sale);
    }

    #[tokio::test]
    async fn accepts_single_bound_keeping_window_valid() {
        let service = fixture::service();
        let sale = fixture::sale(&service, None, None, true).await;
        let end_time = (sale.end_time + fixture::HOUR).coerce();

        let updated = service
            .execute(UpdateSale {
                end_time: Some(end_time),
                ..noop(sale.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.start_time, sale.start_time);
        assert_eq!(updated.end_time, end_time);
        assert_eq!(stored(&service, sale.id).await, updated);
    }

    #[tokio::test]
    async fn fails_on_unknown_sale() {
        let service = fixture::service();
        let id = sale::Id::new();

        let err = service.execute(noop(id)).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::SaleNotExists(i) if *i == id),
        );
    }
}
