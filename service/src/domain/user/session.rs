//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::user;

/// Authenticated session of a user, as issued by the identity provider.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the user this [`Session`] belongs to.
    #[serde(rename = "sub")]
    pub user_id: user::Id,

    /// [`user::Role`]s granted to the user.
    #[serde(default, with = "roles")]
    pub roles: Vec<user::Role>,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Indicates whether this [`Session`] is granted the provided
    /// [`user::Role`].
    #[must_use]
    pub fn has_role(&self, role: user::Role) -> bool {
        self.roles.contains(&role)
    }

    /// Indicates whether this [`Session`] belongs to an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(user::Role::Admin)
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

mod roles {
    //! [`user::Role`]s as a list of `SCREAMING_SNAKE_CASE` strings.
    //!
    //! Roles unknown to this service are skipped.

    use std::str::FromStr as _;

    use super::{user, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        roles: &[user::Role],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(roles.iter().map(ToString::to_string))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<user::Role>, D::Error> {
        Ok(Vec::<String>::deserialize(deserializer)?
            .iter()
            .filter_map(|r| user::Role::from_str(r).ok())
            .collect())
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::user;

    use super::Session;

    #[test]
    fn deserializes_claims() {
        let session: Session = serde_json::from_str(
            r#"{
                "sub": "6f1c5a4e-2b1d-4c1e-9a55-0c3e8a7d1b20",
                "roles": ["CUSTOMER", "ADMIN", "AUDITOR"],
                "exp": 1893456000
            }"#,
        )
        .unwrap();

        assert_eq!(
            session.user_id.to_string(),
            "6f1c5a4e-2b1d-4c1e-9a55-0c3e8a7d1b20",
        );
        assert_eq!(
            session.roles,
            [user::Role::Customer, user::Role::Admin],
        );
        assert!(session.is_admin());
        assert_eq!(session.expires_at.unix_timestamp(), 1_893_456_000);
    }

    #[test]
    fn roles_are_optional() {
        let session: Session = serde_json::from_str(
            r#"{"sub": "6f1c5a4e-2b1d-4c1e-9a55-0c3e8a7d1b20", "exp": 0}"#,
        )
        .unwrap();

        assert!(session.roles.is_empty());
        assert!(!session.is_admin());
    }
}
