//! [`Eligibility`]-related definitions.

use common::Money;
use derive_more::From;
use juniper::{graphql_object, GraphQLEnum};
use service::domain::{self, eligibility};

use crate::Context;

/// Eligibility of the current user to purchase a flash sale item.
#[derive(Clone, Copy, Debug, From)]
pub struct Eligibility(domain::Eligibility);

/// Eligibility of the current user to purchase a `FlashSaleItem` right now.
///
/// It's a hint only: a purchase made afterwards may still fail.
#[graphql_object(name = "FlashSaleEligibility", context = Context)]
impl Eligibility {
    /// Indicator whether the purchase is allowed.
    #[must_use]
    pub fn eligible(&self) -> bool {
        self.0.is_eligible()
    }

    /// Reason of the purchase being disallowed, if it is.
    #[must_use]
    pub fn reason(&self) -> Option<IneligibilityReason> {
        self.0.reason().map(Into::into)
    }

    /// Human-readable message of the `reason`, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.0.reason().map(|r| r.to_string())
    }

    /// Sale price of a single unit, if the purchase is allowed.
    #[must_use]
    pub fn price(&self) -> Option<Money> {
        match self.0 {
            domain::Eligibility::Eligible { price, .. } => Some(price),
            domain::Eligibility::Ineligible(_) => None,
        }
    }

    /// Number of units still available, if known.
    #[must_use]
    pub fn remaining_quantity(&self) -> Option<i32> {
        self.0.remaining_quantity().map(Into::into)
    }
}

/// Reason of a purchase being disallowed.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum IneligibilityReason {
    /// `FlashSaleItem` doesn't exist.
    ItemNotFound,

    /// `FlashSale` is disabled.
    NotActive,

    /// `FlashSale` hasn't started yet.
    NotStarted,

    /// `FlashSale` has ended.
    Ended,

    /// Every unit is sold.
    SoldOut,

    /// Current user has purchased the `FlashSaleItem` already.
    AlreadyPurchased,
}

impl From<eligibility::Reason> for IneligibilityReason {
    fn from(reason: eligibility::Reason) -> Self {
        use eligibility::Reason as R;
        match reason {
            R::ItemNotFound => Self::ItemNotFound,
            R::NotActive => Self::NotActive,
            R::NotStarted => Self::NotStarted,
            R::Ended => Self::Ended,
            R::SoldOut => Self::SoldOut,
            R::AlreadyPurchased => Self::AlreadyPurchased,
        }
    }
}
