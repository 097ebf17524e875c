//! Catalog-related [`Database`] implementations.
//!
//! The catalog tables are only ever read.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::product,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Select<By<Option<read::product::Product>, product::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<read::product::Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<read::product::Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: product::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, price \
            FROM products \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| read::product::Product {
                id: row.get("id"),
                name: row.get("name"),
                price: row.get("price"),
            }))
    }
}

impl<C>
    Database<Select<By<Option<read::product::Variant>, product::VariantId>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<read::product::Variant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<read::product::Variant>, product::VariantId>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: product::VariantId = by.into_inner();

        const SQL: &str = "\
            SELECT id, product_id, name \
            FROM product_variants \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| read::product::Variant {
                id: row.get("id"),
                product_id: row.get("product_id"),
                name: row.get("name"),
            }))
    }
}
