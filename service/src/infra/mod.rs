//! Infrastructure layer.

pub mod cache;
pub mod database;

pub use self::{cache::Cache, database::Database};
#[cfg(any(test, feature = "memory"))]
pub use self::database::{memory, Memory};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
#[cfg(feature = "redis")]
pub use self::cache::{redis, Redis};
