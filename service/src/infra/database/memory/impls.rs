//! [`Database`] implementations.

use std::sync::{Arc, Mutex};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tokio::task;
use tracerr::Traced;

use crate::{
    domain::{
        product,
        sale::{self, item},
        user, Purchase, Sale,
    },
    infra::{database, Database},
    read,
};

use super::{Connection, Error, Memory, NonTx, Tx, TxInner, Undo};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx(Arc::new(TxInner {
            state: Arc::clone(&self.state),
            undo: Mutex::default(),
        }))))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        self.commit();
        Ok(())
    }
}

impl<C: Connection> Database<Select<By<Option<Sale>, sale::Id>>> for Memory<C> {
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        task::yield_now().await;
        Ok(self.state().sales.iter().find(|s| s.id == id).cloned())
    }
}

impl<C: Connection> Database<Select<By<Vec<Sale>, read::sale::All>>>
    for Memory<C>
{
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Sale>, read::sale::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        let mut sales = self.state().sales.clone();
        sales.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sales)
    }
}

impl<C: Connection>
    Database<Select<By<Vec<read::sale::Listing>, read::sale::Open>>>
    for Memory<C>
{
    type Ok = Vec<read::sale::Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::sale::Listing>, read::sale::Open>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::Open(at) = by.into_inner();
        task::yield_now().await;

        let state = self.state();
        let mut listings = state
            .sales
            .iter()
            .filter(|s| s.is_open_at(at))
            .map(|s| read::sale::Listing {
                sale: s.clone(),
                items: state
                    .items
                    .iter()
                    .filter(|i| i.sale_id == s.id)
                    .cloned()
                    .collect(),
            })
            .collect::<Vec<_>>();
        listings.sort_by(|a, b| a.sale.start_time.cmp(&b.sale.start_time));
        Ok(listings)
    }
}

impl<C: Connection> Database<Insert<Sale>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        let id = sale.id;
        self.state().sales.push(sale);
        self.record(Undo::InsertSale(id));
        Ok(())
    }
}

impl<C: Connection> Database<Update<Sale>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        let prev = self
            .state()
            .sales
            .iter_mut()
            .find(|s| s.id == sale.id)
            .map(|s| std::mem::replace(s, sale));
        if let Some(prev) = prev {
            self.record(Undo::UpdateSale(prev));
        }
        Ok(())
    }
}

/// [`Memory`] transactions aren't isolated from each other, so there is nothing
/// to lock.
impl<C: Connection> Database<Lock<By<Sale, sale::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        Ok(())
    }
}

impl<C: Connection> Database<Select<By<Option<sale::Item>, item::Id>>>
    for Memory<C>
{
    type Ok = Option<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<sale::Item>, item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        task::yield_now().await;
        Ok(self.state().items.iter().find(|i| i.id == id).cloned())
    }
}

impl<C: Connection> Database<Select<By<Vec<sale::Item>, sale::Id>>>
    for Memory<C>
{
    type Ok = Vec<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<sale::Item>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sale_id = by.into_inner();
        task::yield_now().await;
        Ok(self
            .state()
            .items
            .iter()
            .filter(|i| i.sale_id == sale_id)
            .cloned()
            .collect())
    }
}

impl<C: Connection>
    Database<Select<By<Option<read::sale::Offer>, read::sale::offer::Selector>>>
    for Memory<C>
{
    type Ok = Option<read::sale::Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<read::sale::Offer>, read::sale::offer::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let selector = by.into_inner();
        task::yield_now().await;

        let state = self.state();
        Ok(state
            .items
            .iter()
            .filter_map(|item| {
                let sale = state.sales.iter().find(|s| s.id == item.sale_id)?;
                let offer = read::sale::Offer {
                    sale: sale.clone(),
                    item: item.clone(),
                };
                Some((selector.rank(&offer)?, offer))
            })
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, offer)| offer))
    }
}

impl<C: Connection> Database<Insert<sale::Item>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<sale::Item>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;
        let id = item.id;
        self.state().items.push(item);
        self.record(Undo::InsertItem(id));
        Ok(())
    }
}

impl<C: Connection> Database<Delete<By<sale::Item, item::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<sale::Item, item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        task::yield_now().await;

        let removed = {
            let mut state = self.state();
            let pos = state.items.iter().position(|i| i.id == id);
            pos.map(|p| state.items.remove(p))
        };
        if let Some(item) = removed {
            self.record(Undo::DeleteItem(item));
        }
        Ok(())
    }
}

impl<C: Connection> Database<Update<item::Sell>> for Memory<C> {
    type Ok = Option<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sell): Update<item::Sell>,
    ) -> Result<Self::Ok, Self::Err> {
        let item::Sell { id, expected } = sell;
        task::yield_now().await;

        let sold = {
            let mut state = self.state();
            state
                .items
                .iter_mut()
                .find(|i| i.id == id)
                .filter(|i| i.revision() == expected && !i.is_sold_out())
                .map(|i| {
                    i.sold_count = i.sold_count.next();
                    i.version = i.version.next();
                    i.clone()
                })
        };
        if sold.is_some() {
            self.record(Undo::Sell(id));
        }
        Ok(sold)
    }
}

impl<C: Connection>
    Database<Select<By<Option<Purchase>, (user::Id, item::Id)>>>
    for Memory<C>
{
    type Ok = Option<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Purchase>, (user::Id, item::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, item_id) = by.into_inner();
        task::yield_now().await;
        Ok(self
            .state()
            .purchases
            .iter()
            .find(|p| p.user_id == user_id && p.item_id == item_id)
            .cloned())
    }
}

impl<C: Connection> Database<Select<By<Vec<Purchase>, user::Id>>>
    for Memory<C>
{
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Purchase>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        task::yield_now().await;

        let mut purchases = self
            .state()
            .purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(purchases)
    }
}

impl<C: Connection> Database<Insert<Purchase>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(purchase): Insert<Purchase>,
    ) -> Result<Self::Ok, Self::Err> {
        task::yield_now().await;

        let id = purchase.id;
        {
            let mut state = self.state();
            if state.purchases.iter().any(|p| {
                p.user_id == purchase.user_id && p.item_id == purchase.item_id
            }) {
                return Err(tracerr::new!(database::Error::from(
                    Error::UniqueViolation(
                        database::PURCHASE_PER_USER_CONSTRAINT,
                    ),
                )));
            }
            state.purchases.push(purchase);
        }
        self.record(Undo::InsertPurchase(id));
        Ok(())
    }
}

impl<C: Connection>
    Database<Select<By<Option<read::product::Product>, product::Id>>>
    for Memory<C>
{
    type Ok = Option<read::product::Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::product::Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        task::yield_now().await;
        Ok(self.state().products.iter().find(|p| p.id == id).cloned())
    }
}

impl<C: Connection>
    Database<Select<By<Option<read::product::Variant>, product::VariantId>>>
    for Memory<C>
{
    type Ok = Option<read::product::Variant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<read::product::Variant>, product::VariantId>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        task::yield_now().await;
        Ok(self.state().variants.iter().find(|v| v.id == id).cloned())
    }
}
