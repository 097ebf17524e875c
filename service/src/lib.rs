//! Flash-sale purchase engine.
//!
//! Sells a strictly limited quantity of promotional items within fixed time
//! windows, at most one unit per user, under arbitrary concurrent demand.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
#[cfg(test)]
mod fixture;
pub mod infra;
pub mod query;
pub mod read;

use std::time::Duration;

use derive_more::Debug;
use smart_default::SmartDefault;

#[cfg(doc)]
use infra::{Cache, Database};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key of the identity provider.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`CatalogCacheConfig`] of the flash sales catalog.
    pub catalog_cache: CatalogCacheConfig,
}

/// Configuration of the [`Cache`] for flash sales catalog reads.
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct CatalogCacheConfig {
    /// Time a cached catalog read stays valid.
    #[default(Duration::from_secs(30))]
    pub ttl: Duration,
}

/// Domain service.
///
/// Holds no state of its own apart from the [`Database`] and [`Cache`]
/// clients, so any number of [`Service`]s may run concurrently.
#[derive(Clone, Debug)]
pub struct Service<Db, C> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Cache`] of this [`Service`].
    cache: C,
}

impl<Db, C> Service<Db, C> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, cache: C) -> Self {
        Self {
            config,
            database,
            cache,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Cache`] of this [`Service`].
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }
}
