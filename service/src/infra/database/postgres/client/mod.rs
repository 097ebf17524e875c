//! Postgres database client definitions.
//!
//! Clients acquire their [`Connection`]s lazily, so creating one is free, and
//! a [`Tx`] started from a [`NonTx`] reuses the [`Connection`] it holds.

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::database::postgres::Connection;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the value of the provided `slot`, initializing it with the `init`
/// [`Future`] first, if it's empty.
async fn get_or_init<T, F, Fut>(
    slot: &RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'_, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_none() {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    } else {
        read
    };

    Ok(RwLockReadGuard::map(guard, |v| {
        v.as_ref()
            .expect("value cannot be dropped while guard is alive")
    }))
}
