//! [`Money`]-related definitions.

use std::{num::ParseIntError, str::FromStr};

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Non-negative amount of money in minor units (cents).
///
/// Prices are never fractional, so all comparisons and computations stay in
/// integer arithmetic.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(try_from = "i64", into = "i64")
)]
pub struct Money(i64);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(0);

    /// Creates a new [`Money`] out of the provided amount of `cents`.
    ///
    /// [`None`] is returned if the amount is negative.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Option<Self> {
        if cents < 0 {
            None
        } else {
            Some(Self(cents))
        }
    }

    /// Returns the amount of cents of this [`Money`].
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Indicates whether this [`Money`] is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for Money {
    type Error = &'static str;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents).ok_or("negative amount")
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cents = s.trim().parse::<i64>().map_err(ParseError::Int)?;
        Self::from_cents(cents).ok_or(ParseError::Negative)
    }
}

/// Error of parsing [`Money`] from a string.
#[derive(Clone, Debug, Display, derive_more::Error, Eq, PartialEq)]
pub enum ParseError {
    /// Amount is not an integer number of cents.
    #[display("invalid amount of cents: {_0}")]
    Int(ParseIntError),

    /// Amount is negative.
    #[display("amount cannot be negative")]
    Negative,
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative amount of money in cents, formatted as a decimal integer
    /// string (e.g. `"5000"` for 50.00).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}
