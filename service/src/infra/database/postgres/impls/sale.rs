//! [`Sale`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{sale, Sale},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Sale`] out of the provided [`Row`], reading its columns with
/// the provided `prefix`.
pub(super) fn from_row(row: &Row, prefix: &str) -> Sale {
    let col = |name: &str| format!("{prefix}{name}");
    Sale {
        id: row.get(col("id").as_str()),
        name: row.get(col("name").as_str()),
        start_time: row.get(col("start_time").as_str()),
        end_time: row.get(col("end_time").as_str()),
        is_active: row.get(col("is_active").as_str()),
        created_at: row.get(col("created_at").as_str()),
    }
}

impl<C> Database<Select<By<Option<Sale>, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Sale>, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: sale::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, start_time, end_time, is_active, created_at \
            FROM flash_sales \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row, "")))
    }
}

impl<C> Database<Select<By<Vec<Sale>, read::sale::All>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Sale>, read::sale::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, name, start_time, end_time, is_active, created_at \
            FROM flash_sales \
            ORDER BY start_time DESC, id";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| from_row(row, ""))
            .collect())
    }
}

impl<C> Database<Select<By<Vec<read::sale::Listing>, read::sale::Open>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::sale::Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::sale::Listing>, read::sale::Open>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::sale::Open(at) = by.into_inner();

        const SALES_SQL: &str = "\
            SELECT id, name, start_time, end_time, is_active, created_at \
            FROM flash_sales \
            WHERE is_active \
              AND start_time <= $1::TIMESTAMPTZ \
              AND end_time >= $1::TIMESTAMPTZ \
            ORDER BY start_time, id";
        let sales = self
            .query(SALES_SQL, &[&at])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| from_row(row, ""))
            .collect::<Vec<_>>();
        if sales.is_empty() {
            return Ok(vec![]);
        }
        let ids = sales.iter().map(|s| s.id).collect::<Vec<_>>();

        const ITEMS_SQL: &str = "\
            SELECT id, sale_id, product_id, variant_id, \
                   price, max_quantity, sold_count, version, \
                   created_at \
            FROM flash_sale_items \
            WHERE sale_id = ANY($1::UUID[]) \
            ORDER BY created_at, id";
        let mut items = self
            .query(ITEMS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| super::item::from_row(row, ""))
            .into_group_map_by(|i| i.sale_id);

        Ok(sales
            .into_iter()
            .map(|sale| read::sale::Listing {
                items: items.remove(&sale.id).unwrap_or_default(),
                sale,
            })
            .collect())
    }
}

impl<C> Database<Insert<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(sale): Insert<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        let Sale {
            id,
            name,
            start_time,
            end_time,
            is_active,
            created_at,
        } = sale;

        const SQL: &str = "\
            INSERT INTO flash_sales (\
                id, name, start_time, end_time, is_active, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::TEXT, $3::TIMESTAMPTZ, $4::TIMESTAMPTZ, \
                $5::BOOL, $6::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[&id, &name, &start_time, &end_time, &is_active, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Sale>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(sale): Update<Sale>,
    ) -> Result<Self::Ok, Self::Err> {
        let Sale {
            id,
            name,
            start_time,
            end_time,
            is_active,
            created_at: _,
        } = sale;

        const SQL: &str = "\
            UPDATE flash_sales \
            SET name = $2::TEXT, \
                start_time = $3::TIMESTAMPTZ, \
                end_time = $4::TIMESTAMPTZ, \
                is_active = $5::BOOL \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &name, &start_time, &end_time, &is_active])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Sale, sale::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Sale, sale::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: sale::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM flash_sales \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
