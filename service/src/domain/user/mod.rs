//! User definitions.
//!
//! Users are owned by an external identity provider, so only their IDs and
//! roles are known here.

pub mod session;

use common::define_kind;
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// ID of a user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Role of a user."]
    enum Role {
        #[doc = "Regular customer."]
        Customer = 1,

        #[doc = "Administrator managing flash sales."]
        Admin = 2,
    }
}
