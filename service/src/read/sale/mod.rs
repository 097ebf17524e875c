//! [`Sale`]-related read definitions.

pub mod offer;

use common::DateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{sale, Sale};

pub use self::offer::Offer;

/// [`Sale`] along with all its [`sale::Item`]s.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Listing {
    /// Listed [`Sale`].
    pub sale: Sale,

    /// [`sale::Item`]s of the [`Sale`], in the order they were added.
    pub items: Vec<sale::Item>,
}

/// Selector of [`Sale`]s open for purchases at the provided moment.
#[derive(Clone, Copy, Debug)]
pub struct Open(pub DateTime);

/// Selector of all the [`Sale`]s, regardless of their status.
#[derive(Clone, Copy, Debug)]
pub struct All;
