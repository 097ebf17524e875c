//! [`Query`] collection related to catalog products.

use common::operations::By;

use crate::{domain::product, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`read::product::Product`] by its [`product::Id`].
pub type ById = DatabaseQuery<By<Option<read::product::Product>, product::Id>>;

/// Queries a [`read::product::Variant`] by its [`product::VariantId`].
pub type VariantById =
    DatabaseQuery<By<Option<read::product::Variant>, product::VariantId>>;
