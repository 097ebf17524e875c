//! [`Command`] for removing a [`sale::Item`] from a [`Sale`].

use common::operations::{By, Delete, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Purchase, Sale};
use crate::{
    domain::sale::{self, item},
    infra::{cache, database, Cache, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`sale::Item`] from a [`Sale`].
///
/// [`Purchase`]s of the removed [`sale::Item`] are kept.
#[derive(Clone, Copy, Debug)]
pub struct RemoveSaleItem {
    /// ID of the [`Sale`] the [`sale::Item`] belongs to.
    pub sale_id: sale::Id,

    /// ID of the [`sale::Item`] to remove.
    pub item_id: item::Id,
}

impl<Db, C> Command<RemoveSaleItem> for Service<Db, C>
where
    Db: Database<
            Select<By<Option<sale::Item>, item::Id>>,
            Ok = Option<sale::Item>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<sale::Item, item::Id>>,
            Err = Traced<database::Error>,
        >,
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemoveSaleItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveSaleItem { sale_id, item_id } = cmd;

        self.database()
            .execute(Select(By::<Option<sale::Item>, _>::new(item_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|i| i.sale_id == sale_id)
            .ok_or(E::ItemNotExists(item_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Delete(By::<sale::Item, _>::new(item_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.invalidate_catalog().await;

        Ok(())
    }
}

/// Error of [`RemoveSaleItem`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`sale::Item`] with the provided ID does not exist in the [`Sale`].
    #[display("`SaleItem(id: {_0})` does not exist")]
    #[from(ignore)]
    ItemNotExists(#[error(not(source))] item::Id),
}
