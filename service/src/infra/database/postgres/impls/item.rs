//! [`sale::Item`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::sale::{self, item},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`sale::Item`] to select.
const COLUMNS: &str = "\
    id, sale_id, product_id, variant_id, \
    price, max_quantity, sold_count, version, \
    created_at";

/// Builds a [`sale::Item`] out of the provided [`Row`], reading its columns
/// with the provided `prefix`.
pub(super) fn from_row(row: &Row, prefix: &str) -> sale::Item {
    let col = |name: &str| format!("{prefix}{name}");
    sale::Item {
        id: row.get(col("id").as_str()),
        sale_id: row.get(col("sale_id").as_str()),
        product_id: row.get(col("product_id").as_str()),
        variant_id: row.get(col("variant_id").as_str()),
        price: row.get(col("price").as_str()),
        max_quantity: row.get(col("max_quantity").as_str()),
        sold_count: row.get(col("sold_count").as_str()),
        version: row.get(col("version").as_str()),
        created_at: row.get(col("created_at").as_str()),
    }
}

impl<C> Database<Select<By<Option<sale::Item>, item::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<sale::Item>, item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: item::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM flash_sale_items \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row, "")))
    }
}

impl<C> Database<Select<By<Vec<sale::Item>, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<sale::Item>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let sale_id: sale::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM flash_sale_items \
             WHERE sale_id = $1::UUID \
             ORDER BY created_at, id",
        );
        Ok(self
            .query(sql.as_str(), &[&sale_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| from_row(row, ""))
            .collect())
    }
}

impl<C>
    Database<Select<By<Option<read::sale::Offer>, read::sale::offer::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<read::sale::Offer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<read::sale::Offer>, read::sale::offer::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::offer::Selector {
            product_id,
            variant_id,
            at,
        } = by.into_inner();

        // `variant_id = NULL` is never true, so without a requested variant
        // only product-wide items match.
        const SQL: &str = "\
            SELECT i.id, i.sale_id, i.product_id, i.variant_id, \
                   i.price, i.max_quantity, i.sold_count, i.version, \
                   i.created_at, \
                   s.id AS s_id, s.name AS s_name, \
                   s.start_time AS s_start_time, s.end_time AS s_end_time, \
                   s.is_active AS s_is_active, s.created_at AS s_created_at \
            FROM flash_sale_items AS i \
            INNER JOIN flash_sales AS s ON s.id = i.sale_id \
            WHERE i.product_id = $1::UUID \
              AND (i.variant_id IS NULL OR i.variant_id = $2::UUID) \
              AND s.is_active \
              AND s.start_time <= $3::TIMESTAMPTZ \
              AND s.end_time >= $3::TIMESTAMPTZ \
            ORDER BY i.variant_id IS NULL, i.price, s.end_time, i.id \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&product_id, &variant_id, &at])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| read::sale::Offer {
                sale: super::sale::from_row(&row, "s_"),
                item: from_row(&row, ""),
            }))
    }
}

impl<C> Database<Insert<sale::Item>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<sale::Item>,
    ) -> Result<Self::Ok, Self::Err> {
        let sale::Item {
            id,
            sale_id,
            product_id,
            variant_id,
            price,
            max_quantity,
            sold_count,
            version,
            created_at,
        } = item;

        const SQL: &str = "\
            INSERT INTO flash_sale_items (\
                id, sale_id, product_id, variant_id, \
                price, max_quantity, sold_count, version, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::INT8, $6::INT4, $7::INT4, $8::INT8, \
                $9::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &sale_id,
                &product_id,
                &variant_id,
                &price,
                &max_quantity,
                &sold_count,
                &version,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<sale::Item, item::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<sale::Item, item::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: item::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM flash_sale_items \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Applies the [`item::Sell`] compare-and-swap, returning the updated
/// [`sale::Item`], or [`None`] if its state has changed since it was read.
impl<C> Database<Update<item::Sell>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<sale::Item>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sell): Update<item::Sell>,
    ) -> Result<Self::Ok, Self::Err> {
        let item::Sell {
            id,
            expected: item::Revision {
                sold_count,
                version,
            },
        } = sell;

        let sql = format!(
            "UPDATE flash_sale_items \
             SET sold_count = sold_count + 1, \
                 version = version + 1 \
             WHERE id = $1::UUID \
               AND version = $2::INT8 \
               AND sold_count = $3::INT4 \
               AND sold_count < max_quantity \
             RETURNING {COLUMNS}",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id, &version, &sold_count])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row, "")))
    }
}
