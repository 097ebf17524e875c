//! User-related definitions.

use derive_more::{Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;
use uuid::Uuid;

/// Unique identifier of a user, issued by the identity provider.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);
