//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// The `SERIALIZABLE` transaction is started on the first statement, and is
/// rolled back once the last clone of this client is dropped without a
/// [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire a [`Connection`] from, if the
    /// originating [`NonTx`] client has none.
    pool: connection::Pool,

    /// [`NonTx`] client this [`Tx`] client was created from, until its
    /// [`Connection`] is taken.
    non_tx: Arc<RwLock<Option<NonTx>>>,

    /// Lazily started [`connection::Tx`].
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            non_tx: Arc::new(RwLock::new(Some(client))),
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the underlying [`Connection`] of this [`Tx`] client, starting
    /// the transaction if it's not started yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        super::get_or_init(&self.tx, || async {
            let existing = match self.non_tx.write().await.take() {
                Some(cl) => cl.take_connection().await,
                None => None,
            };
            let conn = match existing {
                Some(c) => c,
                None => self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?,
            };
            let tx = connection::Tx::from_non_tx(conn)
                .await
                .map_err(tracerr::wrap!())?;
            Ok::<_, Traced<database::Error>>(tx)
        })
        .await
    }

    /// Commits this [`Tx`] client.
    ///
    /// Does nothing if no statement has been executed yet.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
