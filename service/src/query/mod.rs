//! [`Query`] definition.

pub mod product;
pub mod purchases;
pub mod sale;
pub mod sales;

use std::future::Future;

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;
use tracing as log;

use crate::{
    infra::{cache, database, Cache, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, C, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db, C>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<Db, C> Service<Db, C> {
    /// Returns the value [`Cache`]d under the provided [`cache::Key`], or
    /// performs the provided `read` and caches its result.
    ///
    /// A cached result is dropped right away if the catalog changed while it
    /// was read (the [`cache::Epoch`] differs), so it never outlives the
    /// change by more than its `read`.
    ///
    /// [`Cache`] failures are only logged, so the `read` result is returned
    /// whenever the [`Cache`] is unavailable.
    pub(crate) async fn read_through<T>(
        &self,
        key: cache::Key,
        read: impl Future<Output = Result<T, Traced<database::Error>>>,
    ) -> Result<T, Traced<database::Error>>
    where
        T: Clone,
        C: Cache<
                Select<By<Option<T>, cache::Key>>,
                Ok = Option<T>,
                Err = Traced<cache::Error>,
            > + Cache<Insert<cache::Entry<T>>, Err = Traced<cache::Error>>
            + Cache<
                Select<By<Option<cache::Epoch>, cache::Key>>,
                Ok = Option<cache::Epoch>,
                Err = Traced<cache::Error>,
            > + Cache<Delete<cache::Key>, Err = Traced<cache::Error>>,
    {
        match self
            .cache()
            .execute(Select(By::<Option<T>, _>::new(key.clone())))
            .await
        {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => log::warn!("failed to read `{key}` from cache: {e}"),
        }

        let epoch = self.catalog_epoch().await;
        let value = read.await.map_err(tracerr::wrap!())?;

        if let Err(e) = self
            .cache()
            .execute(Insert(cache::Entry {
                key: key.clone(),
                value: value.clone(),
                ttl: self.config().catalog_cache.ttl,
            }))
            .await
        {
            log::warn!("failed to put `{key}` into cache: {e}");
            return Ok(value);
        }

        if epoch.is_none() || self.catalog_epoch().await != epoch {
            if let Err(e) = self.cache().execute(Delete(key.clone())).await {
                log::warn!("failed to drop outdated `{key}` from cache: {e}");
            }
        }

        Ok(value)
    }

    /// Reads the current [`cache::Epoch`] of the catalog.
    ///
    /// [`None`] is returned if it cannot be read.
    async fn catalog_epoch(&self) -> Option<Option<cache::Epoch>>
    where
        C: Cache<
            Select<By<Option<cache::Epoch>, cache::Key>>,
            Ok = Option<cache::Epoch>,
            Err = Traced<cache::Error>,
        >,
    {
        self.cache()
            .execute(Select(By::new(cache::Key::catalog_epoch())))
            .await
            .map_err(|e| log::warn!("failed to read catalog epoch: {e}"))
            .ok()
    }
}

#[cfg(test)]
mod spec {
    use crate::{fixture, infra::cache};

    #[tokio::test]
    async fn caches_read_value() {
        let service = fixture::service();
        let key = cache::Key::active_sales();

        let value = service
            .read_through(key.clone(), async { Ok(String::from("fresh")) })
            .await
            .unwrap();

        assert_eq!(value, "fresh");
        assert!(service.cache().contains(&key));
        let cached = service
            .read_through(key.clone(), async { Ok(String::from("ignored")) })
            .await
            .unwrap();
        assert_eq!(cached, "fresh");
    }

    #[tokio::test]
    async fn drops_value_read_across_catalog_change() {
        let service = fixture::service();
        let key = cache::Key::active_sales();

        let value = service
            .read_through(key.clone(), async {
                let read_before_change = String::from("outdated");
                service.invalidate_catalog().await;
                Ok(read_before_change)
            })
            .await
            .unwrap();

        assert_eq!(value, "outdated");
        assert!(!service.cache().contains(&key));

        let value = service
            .read_through(key.clone(), async { Ok(String::from("current")) })
            .await
            .unwrap();
        assert_eq!(value, "current");
        assert!(service.cache().contains(&key));
    }
}
