//! [`Command`] definition.

pub mod add_sale_item;
pub mod authorize_user_session;
pub mod create_sale;
pub mod purchase_sale_item;
pub mod remove_sale_item;
pub mod update_sale;

use common::operations::{Delete, Insert};
use tracerr::Traced;
use tracing as log;

use crate::{
    infra::{cache, Cache},
    Service,
};

/// [`Command`] of the [`Service`].
pub use common::Handler as Command;

pub use self::{
    add_sale_item::AddSaleItem, authorize_user_session::AuthorizeUserSession,
    create_sale::CreateSale, purchase_sale_item::PurchaseSaleItem,
    remove_sale_item::RemoveSaleItem, update_sale::UpdateSale,
};

impl<Db, C> Service<Db, C>
where
    C: Cache<Delete<cache::Key>, Err = Traced<cache::Error>>
        + Cache<Delete<cache::Pattern>, Err = Traced<cache::Error>>
        + Cache<Insert<cache::Entry<cache::Epoch>>, Err = Traced<cache::Error>>,
{
    /// Drops every [`Cache`]d flash sales catalog read after a change of the
    /// catalog.
    ///
    /// The [`cache::Epoch`] is renewed before, so reads started earlier don't
    /// keep their outdated values cached.
    ///
    /// Failures are only logged, as the stale values expire on their own.
    pub(crate) async fn invalidate_catalog(&self) {
        if let Err(e) = self
            .cache()
            .execute(Insert(cache::Entry {
                key: cache::Key::catalog_epoch(),
                value: cache::Epoch::generate(),
                ttl: cache::Epoch::TTL,
            }))
            .await
        {
            log::error!("Failed to renew flash sales catalog epoch: {e}");
        }
        if let Err(e) =
            self.cache().execute(Delete(cache::Key::active_sales())).await
        {
            log::error!("Failed to invalidate active flash sales: {e}");
        }
        if let Err(e) = self
            .cache()
            .execute(Delete(cache::Pattern::sales_for_products()))
            .await
        {
            log::error!("Failed to invalidate flash sales of products: {e}");
        }
    }
}
