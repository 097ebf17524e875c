//! GraphQL API definitions.

pub mod eligibility;
mod mutation;
pub mod product;
pub mod purchase;
mod query;
pub mod sale;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    eligibility::Eligibility, mutation::Mutation, purchase::Purchase,
    query::Query, sale::Sale,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user must be an administrator"]
        Admin,
    }
}
