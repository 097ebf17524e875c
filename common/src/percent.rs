//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;

use crate::Money;

/// Whole percentage in the `0..=100` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Percent(u8);

impl Percent {
    /// Creates a new [`Percent`] by checking the provided value doesn't exceed
    /// `100`.
    #[must_use]
    pub const fn new(val: u8) -> Option<Self> {
        if val > 100 {
            None
        } else {
            Some(Self(val))
        }
    }

    /// Returns the value of this [`Percent`].
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Calculates the discount of the `sale` price relative to the `original`
    /// one, as `round((1 - sale / original) * 100)`.
    ///
    /// Rounding is half away from zero and done in integer arithmetic. A `sale`
    /// price not lower than the `original` one gives a zero discount.
    ///
    /// [`None`] is returned if the `original` price is zero.
    #[must_use]
    pub fn discount(original: Money, sale: Money) -> Option<Self> {
        if original.is_zero() {
            return None;
        }
        if sale >= original {
            return Some(Self(0));
        }

        let original = i128::from(original.cents());
        let off = (original - i128::from(sale.cents())) * 100;
        let rounded = (2 * off + original) / (2 * original);

        u8::try_from(rounded).ok().and_then(Self::new)
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Whole percentage in the `0..=100` range.
    #[graphql_scalar(with = Self, parse_token(i32))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(p: &Percent) -> Value<S> {
            Value::scalar(i32::from(p.get()))
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_int_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-integer value: {input}",
                    )
                })
                .and_then(|v| {
                    u8::try_from(v)
                        .ok()
                        .and_then(Self::new)
                        .ok_or_else(|| {
                            format!("`Percent` out of range: {v}")
                        })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::Money;

    use super::Percent;

    fn cents(v: i64) -> Money {
        Money::from_cents(v).unwrap()
    }

    fn discount(original: i64, sale: i64) -> Option<u8> {
        Percent::discount(cents(original), cents(sale)).map(Percent::get)
    }

    #[test]
    fn rounds_discount() {
        assert_eq!(discount(10_000, 5_000), Some(50));
        assert_eq!(discount(3_000, 1_999), Some(33));
        assert_eq!(discount(3_000, 1_000), Some(67));
        assert_eq!(discount(200, 199), Some(1));
        assert_eq!(discount(1_000, 0), Some(100));
    }

    #[test]
    fn no_discount_when_not_cheaper() {
        assert_eq!(discount(1_000, 1_000), Some(0));
        assert_eq!(discount(1_000, 1_500), Some(0));
    }

    #[test]
    fn no_discount_without_original_price() {
        assert_eq!(discount(0, 0), None);
        assert_eq!(discount(0, 100), None);
    }

    #[test]
    fn bounds() {
        assert!(Percent::new(100).is_some());
        assert!(Percent::new(101).is_none());
        assert!("42".parse::<Percent>().is_ok());
        assert!("142".parse::<Percent>().is_err());
        assert!("-1".parse::<Percent>().is_err());
    }
}
