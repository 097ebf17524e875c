//! [`Purchase`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{sale::item, user, Purchase},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Purchase`] out of the provided [`Row`].
fn from_row(row: &Row) -> Purchase {
    Purchase {
        id: row.get("id"),
        user_id: row.get("user_id"),
        item_id: row.get("item_id"),
        product_id: row.get("product_id"),
        variant_id: row.get("variant_id"),
        price: row.get("price"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Purchase>, (user::Id, item::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Purchase>, (user::Id, item::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, item_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, item_id, product_id, variant_id, \
                   price, created_at \
            FROM flash_sale_purchases \
            WHERE user_id = $1::UUID \
              AND item_id = $2::UUID";
        Ok(self
            .query_opt(SQL, &[&user_id, &item_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Select<By<Vec<Purchase>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Purchase>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Purchase>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, item_id, product_id, variant_id, \
                   price, created_at \
            FROM flash_sale_purchases \
            WHERE user_id = $1::UUID \
            ORDER BY created_at DESC, id";
        Ok(self
            .query(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Purchase>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(purchase): Insert<Purchase>,
    ) -> Result<Self::Ok, Self::Err> {
        let Purchase {
            id,
            user_id,
            item_id,
            product_id,
            variant_id,
            price,
            created_at,
        } = purchase;

        const SQL: &str = "\
            INSERT INTO flash_sale_purchases (\
                id, user_id, item_id, product_id, variant_id, \
                price, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT8, $7::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &item_id,
                &product_id,
                &variant_id,
                &price,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
