//! Catalog product references.

use derive_more::{Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;
use uuid::Uuid;

/// Unique identifier of a catalog product.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::product::Id)]
#[into(domain::product::Id)]
#[graphql(name = "ProductId", transparent)]
pub struct Id(Uuid);

/// Unique identifier of a catalog product variant.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::product::VariantId)]
#[into(domain::product::VariantId)]
#[graphql(name = "ProductVariantId", transparent)]
pub struct VariantId(Uuid);
