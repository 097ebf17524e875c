//! [`Eligibility`] of a user to purchase a [`SaleItem`].

use common::{DateTime, Money};
use derive_more::{Display, Error};
use strum::IntoStaticStr;

#[cfg(doc)]
use crate::domain::SaleItem;
use crate::domain::{
    sale::{self, item, Status},
    Sale,
};

/// Result of evaluating whether a user may purchase a [`SaleItem`] right now.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Eligibility {
    /// User may purchase the [`SaleItem`].
    Eligible {
        /// ID of the [`SaleItem`].
        item_id: item::Id,

        /// Price of a single unit.
        price: Money,

        /// Number of units still available.
        remaining_quantity: item::Quantity,
    },

    /// User may not purchase the [`SaleItem`] for the [`Reason`].
    Ineligible(Reason),
}

impl Eligibility {
    /// Evaluates the [`Eligibility`] out of the provided [`Snapshot`] at the
    /// provided moment.
    ///
    /// The checks run in a fixed order and the first failing one wins:
    /// existence, activation, start, end, stock and then the user's previous
    /// purchase.
    #[must_use]
    pub fn evaluate(snapshot: &Snapshot<'_>, now: DateTime) -> Self {
        let Some((sale, item)) = snapshot.offer else {
            return Self::Ineligible(Reason::ItemNotFound);
        };

        match sale.status(now) {
            Status::Inactive => return Self::Ineligible(Reason::NotActive),
            Status::NotStarted => return Self::Ineligible(Reason::NotStarted),
            Status::Ended => return Self::Ineligible(Reason::Ended),
            Status::Active => {}
        }

        if item.is_sold_out() {
            return Self::Ineligible(Reason::SoldOut);
        }
        if snapshot.already_purchased {
            return Self::Ineligible(Reason::AlreadyPurchased);
        }

        Self::Eligible {
            item_id: item.id,
            price: item.price,
            remaining_quantity: item.remaining_quantity(),
        }
    }

    /// Evaluates the [`Eligibility`] for an actual purchase.
    ///
    /// Same as [`Eligibility::evaluate()`], except that the user's previous
    /// purchase of an existing [`SaleItem`] is reported before any other
    /// [`Reason`], so repeated purchases fail identically whatever the stock
    /// or the [`Sale`] window became.
    #[must_use]
    pub fn evaluate_purchase(snapshot: &Snapshot<'_>, now: DateTime) -> Self {
        if snapshot.offer.is_some() && snapshot.already_purchased {
            return Self::Ineligible(Reason::AlreadyPurchased);
        }
        Self::evaluate(snapshot, now)
    }

    /// Indicates whether this is an [`Eligibility::Eligible`] one.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    /// Returns the [`Reason`] of ineligibility, if any.
    #[must_use]
    pub fn reason(&self) -> Option<Reason> {
        match self {
            Self::Eligible { .. } => None,
            Self::Ineligible(r) => Some(*r),
        }
    }

    /// Returns the number of units still available, if it's known.
    ///
    /// Sold out [`SaleItem`]s report zero.
    #[must_use]
    pub fn remaining_quantity(&self) -> Option<item::Quantity> {
        match self {
            Self::Eligible {
                remaining_quantity, ..
            } => Some(*remaining_quantity),
            Self::Ineligible(Reason::SoldOut) => Some(item::Quantity::ZERO),
            Self::Ineligible(_) => None,
        }
    }
}

/// State an [`Eligibility`] is evaluated on.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    /// [`SaleItem`] along with its [`Sale`], if the item exists.
    pub offer: Option<(&'a Sale, &'a sale::Item)>,

    /// Indicator whether the user has purchased the [`SaleItem`] already.
    pub already_purchased: bool,
}

/// Reason of a user being ineligible to purchase a [`SaleItem`].
///
/// [`Display`]ed as a human-readable message, while [`Reason::code()`] is a
/// stable machine-checkable one.
#[derive(
    Clone, Copy, Debug, Display, Eq, Error, Hash, IntoStaticStr, PartialEq,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    /// [`SaleItem`] doesn't exist.
    #[display("Flash sale item not found")]
    ItemNotFound,

    /// [`Sale`] is disabled.
    #[display("Flash sale is not active")]
    NotActive,

    /// [`Sale`] hasn't started yet.
    #[display("Flash sale has not started yet")]
    NotStarted,

    /// [`Sale`] has ended.
    #[display("Flash sale has ended")]
    Ended,

    /// Every unit of the [`SaleItem`] is sold.
    #[display("Sold out")]
    SoldOut,

    /// User has purchased the [`SaleItem`] already.
    #[display("Already purchased")]
    AlreadyPurchased,
}

impl Reason {
    /// Returns the stable `SCREAMING_SNAKE_CASE` code of this [`Reason`].
    #[must_use]
    pub fn code(self) -> &'static str {
        self.into()
    }

    /// Returns the [`Class`] of this [`Reason`].
    #[must_use]
    pub fn class(self) -> Class {
        match self {
            Self::ItemNotFound => Class::NotFound,
            Self::NotActive | Self::NotStarted | Self::Ended => {
                Class::BadRequest
            }
            Self::SoldOut | Self::AlreadyPurchased => Class::Conflict,
        }
    }
}

/// Class of a failure, telling how a client should treat it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Class {
    /// Something referred to doesn't exist.
    NotFound,

    /// Request is invalid in the current state.
    BadRequest,

    /// Request lost to a contention or duplicates a previous one. Retryable.
    Conflict,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Money};

    use crate::domain::{
        product,
        sale::{self, item},
        Sale,
    };

    use super::{Class, Eligibility, Reason, Snapshot};

    fn sale(now: DateTime, is_active: bool) -> Sale {
        Sale {
            id: sale::Id::new(),
            name: sale::Name::new("Flash").unwrap(),
            start_time: (now - Duration::from_secs(60)).coerce(),
            end_time: (now + Duration::from_secs(600)).coerce(),
            is_active,
            created_at: now.coerce(),
        }
    }

    fn item(sale: &Sale, max: i32, sold: i32) -> sale::Item {
        sale::Item {
            id: item::Id::new(),
            sale_id: sale.id,
            product_id: product::Id::new(),
            variant_id: None,
            price: Money::from_cents(5000).unwrap(),
            max_quantity: item::Quantity::new(max).unwrap(),
            sold_count: item::Quantity::new(sold).unwrap(),
            version: item::Version::INITIAL,
            created_at: sale.created_at.coerce(),
        }
    }

    fn evaluate(
        sale: &Sale,
        item: &sale::Item,
        already_purchased: bool,
        now: DateTime,
    ) -> Eligibility {
        Eligibility::evaluate(
            &Snapshot {
                offer: Some((sale, item)),
                already_purchased,
            },
            now,
        )
    }

    #[test]
    fn eligible_reports_remaining_quantity() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let item = item(&sale, 10, 3);

        let res = evaluate(&sale, &item, false, now);

        assert_eq!(
            res,
            Eligibility::Eligible {
                item_id: item.id,
                price: Money::from_cents(5000).unwrap(),
                remaining_quantity: item::Quantity::new(7).unwrap(),
            },
        );
        assert!(res.is_eligible());
        assert_eq!(res.reason(), None);
    }

    #[test]
    fn missing_item_is_not_found() {
        let res = Eligibility::evaluate(
            &Snapshot {
                offer: None,
                already_purchased: true,
            },
            DateTime::now(),
        );

        assert_eq!(res, Eligibility::Ineligible(Reason::ItemNotFound));
        assert_eq!(res.remaining_quantity(), None);
    }

    #[test]
    fn inactive_wins_over_time_window() {
        let now = DateTime::now();
        let sale = sale(now, false);
        let item = item(&sale, 1, 1);

        let later = now + Duration::from_secs(3600);
        assert_eq!(
            evaluate(&sale, &item, true, later).reason(),
            Some(Reason::NotActive),
        );
    }

    #[test]
    fn time_window_wins_over_stock() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let item = item(&sale, 1, 1);

        let earlier = now - Duration::from_secs(61);
        assert_eq!(
            evaluate(&sale, &item, true, earlier).reason(),
            Some(Reason::NotStarted),
        );

        let later = now + Duration::from_secs(601);
        assert_eq!(
            evaluate(&sale, &item, true, later).reason(),
            Some(Reason::Ended),
        );
    }

    #[test]
    fn ended_regardless_of_quantity() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let item = item(&sale, 100, 0);

        let res = evaluate(&sale, &item, false, now + Duration::from_secs(601));

        assert_eq!(res.reason(), Some(Reason::Ended));
        assert_eq!(res.reason().unwrap().to_string(), "Flash sale has ended");
    }

    #[test]
    fn sold_out_wins_over_previous_purchase_when_advising() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let item = item(&sale, 2, 2);

        let res = evaluate(&sale, &item, true, now);

        assert_eq!(res.reason(), Some(Reason::SoldOut));
        assert_eq!(res.remaining_quantity(), Some(item::Quantity::ZERO));
    }

    #[test]
    fn previous_purchase_wins_when_purchasing() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let sold_out = item(&sale, 1, 1);

        let snapshot = Snapshot {
            offer: Some((&sale, &sold_out)),
            already_purchased: true,
        };
        assert_eq!(
            Eligibility::evaluate_purchase(&snapshot, now).reason(),
            Some(Reason::AlreadyPurchased),
        );
        assert_eq!(
            Eligibility::evaluate_purchase(
                &snapshot,
                now + Duration::from_secs(601),
            )
            .reason(),
            Some(Reason::AlreadyPurchased),
        );

        let first_time = Snapshot {
            already_purchased: false,
            ..snapshot
        };
        assert_eq!(
            Eligibility::evaluate_purchase(&first_time, now).reason(),
            Some(Reason::SoldOut),
        );
        assert_eq!(
            Eligibility::evaluate_purchase(
                &Snapshot {
                    offer: None,
                    already_purchased: true,
                },
                now,
            )
            .reason(),
            Some(Reason::ItemNotFound),
        );
    }

    #[test]
    fn previous_purchase_makes_ineligible() {
        let now = DateTime::now();
        let sale = sale(now, true);
        let item = item(&sale, 2, 1);

        assert_eq!(
            evaluate(&sale, &item, true, now).reason(),
            Some(Reason::AlreadyPurchased),
        );
    }

    #[test]
    fn reasons_messages_and_codes() {
        for (reason, message, code, class) in [
            (
                Reason::ItemNotFound,
                "Flash sale item not found",
                "ITEM_NOT_FOUND",
                Class::NotFound,
            ),
            (
                Reason::NotActive,
                "Flash sale is not active",
                "NOT_ACTIVE",
                Class::BadRequest,
            ),
            (
                Reason::NotStarted,
                "Flash sale has not started yet",
                "NOT_STARTED",
                Class::BadRequest,
            ),
            (
                Reason::Ended,
                "Flash sale has ended",
                "ENDED",
                Class::BadRequest,
            ),
            (Reason::SoldOut, "Sold out", "SOLD_OUT", Class::Conflict),
            (
                Reason::AlreadyPurchased,
                "Already purchased",
                "ALREADY_PURCHASED",
                Class::Conflict,
            ),
        ] {
            assert_eq!(reason.to_string(), message);
            assert_eq!(reason.code(), code);
            assert_eq!(reason.class(), class);
        }
    }
}
