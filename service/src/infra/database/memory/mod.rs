//! In-memory [`Database`] implementation.
//!
//! Mirrors the semantics the [`Postgres`] implementation relies on:
//! conditional updates, the unique [`Purchase`] per user constraint and
//! all-or-nothing transactions. Writes are applied eagerly and reverted if the
//! transaction is dropped without a commit. Every operation yields to the
//! runtime first, so concurrently executed operations interleave.
//!
//! [`Postgres`]: crate::infra::Postgres

mod impls;

use std::{
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::{Deref, Display, Error as StdError};

use crate::{
    domain::{purchase, sale, Purchase, Sale},
    read,
};
#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx {
            state: Arc::default(),
        })
    }

    /// Adds the provided catalog [`read::product::Product`].
    pub fn add_product(&self, product: read::product::Product) {
        self.state().products.push(product);
    }

    /// Adds the provided catalog [`read::product::Variant`].
    pub fn add_variant(&self, variant: read::product::Variant) {
        self.state().variants.push(variant);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Stored data of a [`Memory`] database.
#[derive(Debug, Default)]
pub struct State {
    /// Stored [`Sale`]s.
    sales: Vec<Sale>,

    /// Stored [`sale::Item`]s, in the order they were added.
    items: Vec<sale::Item>,

    /// Stored [`Purchase`]s.
    purchases: Vec<Purchase>,

    /// Catalog [`read::product::Product`]s.
    products: Vec<read::product::Product>,

    /// Catalog [`read::product::Variant`]s.
    variants: Vec<read::product::Variant>,
}

impl State {
    /// Reverts the provided [`Undo`] change.
    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::InsertSale(id) => self.sales.retain(|s| s.id != id),
            Undo::UpdateSale(prev) => {
                if let Some(s) = self.sales.iter_mut().find(|s| s.id == prev.id)
                {
                    *s = prev;
                }
            }
            Undo::InsertItem(id) => self.items.retain(|i| i.id != id),
            Undo::DeleteItem(item) => self.items.push(item),
            Undo::Sell(id) => {
                if let Some(i) = self.items.iter_mut().find(|i| i.id == id) {
                    i.sold_count = i.sold_count.prev();
                }
            }
            Undo::InsertPurchase(id) => self.purchases.retain(|p| p.id != id),
        }
    }
}

/// Change to be reverted when its transaction is rolled back.
#[derive(Debug)]
pub enum Undo {
    /// [`Sale`] was inserted.
    InsertSale(sale::Id),

    /// [`Sale`] was updated from the contained state.
    UpdateSale(Sale),

    /// [`sale::Item`] was inserted.
    InsertItem(sale::item::Id),

    /// Contained [`sale::Item`] was deleted.
    DeleteItem(sale::Item),

    /// Unit of a [`sale::Item`] was sold.
    Sell(sale::item::Id),

    /// [`Purchase`] was inserted.
    InsertPurchase(purchase::Id),
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Connection {
    /// Locks the [`State`] for a single operation.
    fn state(&self) -> MutexGuard<'_, State>;

    /// Records the provided [`Undo`] to be reverted on a rollback.
    fn record(&self, undo: Undo);
}

/// Non-transactional [`Memory`] database client.
///
/// Every operation is committed on its own.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// Shared [`State`] of the database.
    state: Arc<Mutex<State>>,
}

impl Connection for NonTx {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, _: Undo) {}
}

/// Transactional [`Memory`] database client.
///
/// Rolled back once the last clone of it is dropped without a
/// [`Tx::commit()`].
#[derive(Clone, Debug)]
pub struct Tx(Arc<TxInner>);

/// Inner representation of a [`Tx`] client.
#[derive(Debug)]
struct TxInner {
    /// Shared [`State`] of the database.
    state: Arc<Mutex<State>>,

    /// Changes made by this transaction so far, in the order they were made.
    undo: Mutex<Vec<Undo>>,
}

impl Tx {
    /// Commits this [`Tx`], so it won't be rolled back anymore.
    pub fn commit(&self) {
        drop(mem::take(
            &mut *self.0.undo.lock().unwrap_or_else(PoisonError::into_inner),
        ));
    }
}

impl Connection for Tx {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, undo: Undo) {
        self.0
            .undo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(undo);
    }
}

impl Drop for TxInner {
    fn drop(&mut self) {
        let undo =
            mem::take(self.undo.get_mut().unwrap_or_else(PoisonError::into_inner));
        if undo.is_empty() {
            return;
        }
        let mut state =
            self.state.lock().unwrap_or_else(PoisonError::into_inner);
        for u in undo.into_iter().rev() {
            state.revert(u);
        }
    }
}

/// [`Memory`] database error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
        }
    }
}
