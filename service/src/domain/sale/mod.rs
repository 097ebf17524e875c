//! [`Sale`] definitions.

pub mod item;

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::item::Item;

/// Flash sale: a time-boxed promotional event offering a limited quantity of
/// [`Item`]s at discounted prices.
///
/// The [`Status`] of a [`Sale`] is never stored. It's derived from the
/// [`Sale::is_active`] flag and the time window on every read.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Sale {
    /// ID of this [`Sale`].
    pub id: Id,

    /// [`Name`] of this [`Sale`].
    pub name: Name,

    /// [`DateTime`] when this [`Sale`] starts.
    pub start_time: StartDateTime,

    /// [`DateTime`] when this [`Sale`] ends.
    pub end_time: EndDateTime,

    /// Indicator whether this [`Sale`] is enabled by an administrator.
    pub is_active: bool,

    /// [`DateTime`] when this [`Sale`] was created.
    pub created_at: CreationDateTime,
}

impl Sale {
    /// Returns [`Status`] of this [`Sale`] at the provided moment.
    ///
    /// Both ends of the time window are inclusive.
    #[must_use]
    pub fn status(&self, at: DateTime) -> Status {
        if !self.is_active {
            Status::Inactive
        } else if at.is_before(&self.start_time) {
            Status::NotStarted
        } else if at.is_after(&self.end_time) {
            Status::Ended
        } else {
            Status::Active
        }
    }

    /// Indicates whether this [`Sale`] accepts purchases at the provided
    /// moment.
    #[must_use]
    pub fn is_open_at(&self, at: DateTime) -> bool {
        self.status(at) == Status::Active
    }

    /// Checks whether the provided time window is valid, i.e. it ends strictly
    /// after it starts.
    #[must_use]
    pub fn is_valid_window(start: StartDateTime, end: EndDateTime) -> bool {
        end.is_after(&start)
    }
}

/// ID of a [`Sale`].
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

/// Name of a [`Sale`].
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` is trimmed, not empty and
    /// not longer than 512 bytes.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

define_kind! {
    #[doc = "Effective status of a [`Sale`], derived at evaluation time."]
    enum Status {
        #[doc = "[`Sale`] is enabled, but its time window hasn't begun yet."]
        NotStarted = 1,

        #[doc = "[`Sale`] is enabled and within its time window."]
        Active = 2,

        #[doc = "[`Sale`] time window is over."]
        Ended = 3,

        #[doc = "[`Sale`] is disabled by an administrator."]
        Inactive = 4,
    }
}

/// [`DateTime`] when a [`Sale`] was created.
pub type CreationDateTime = DateTimeOf<(Sale, unit::Creation)>;

/// [`DateTime`] when a [`Sale`] starts.
pub type StartDateTime = DateTimeOf<(Sale, unit::Start)>;

/// [`DateTime`] when a [`Sale`] ends.
pub type EndDateTime = DateTimeOf<(Sale, unit::End)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use super::{Id, Name, Sale, Status};

    fn sale(now: DateTime, is_active: bool) -> Sale {
        Sale {
            id: Id::new(),
            name: Name::new("Black Friday").unwrap(),
            start_time: (now - Duration::from_secs(60)).coerce(),
            end_time: (now + Duration::from_secs(600)).coerce(),
            is_active,
            created_at: now.coerce(),
        }
    }

    #[test]
    fn derives_status_from_time_window() {
        let now = DateTime::now();
        let sale = sale(now, true);

        assert_eq!(sale.status(now), Status::Active);
        assert_eq!(
            sale.status(now - Duration::from_secs(61)),
            Status::NotStarted,
        );
        assert_eq!(sale.status(now + Duration::from_secs(601)), Status::Ended);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = DateTime::now();
        let sale = sale(now, true);

        assert!(sale.is_open_at(sale.start_time.coerce()));
        assert!(sale.is_open_at(sale.end_time.coerce()));
    }

    #[test]
    fn disabled_sale_is_inactive_at_any_time() {
        let now = DateTime::now();
        let sale = sale(now, false);

        assert_eq!(sale.status(now), Status::Inactive);
        assert_eq!(sale.status(now + Duration::from_secs(601)), Status::Inactive);
        assert!(!sale.is_open_at(now));
    }

    #[test]
    fn validates_window() {
        let now = DateTime::now();

        assert!(Sale::is_valid_window(
            now.coerce(),
            (now + Duration::from_secs(1)).coerce(),
        ));
        assert!(!Sale::is_valid_window(now.coerce(), now.coerce()));
        assert!(!Sale::is_valid_window(
            now.coerce(),
            (now - Duration::from_secs(1)).coerce(),
        ));
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("Summer sale").is_some());
        assert!(Name::new("").is_none());
        assert!(Name::new(" padded ").is_none());
        assert!(Name::new("x".repeat(513)).is_none());
    }
}
