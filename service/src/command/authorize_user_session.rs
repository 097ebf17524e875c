//! [`Command`] for authorizing a user [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a user [`Session`] issued by the identity
/// provider.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, C> Command<AuthorizeUserSession> for Service<Db, C> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use crate::{
        domain::user::{self, session},
        fixture, Command as _,
    };

    use super::AuthorizeUserSession;

    fn token(secret: &[u8], expires_in: Duration, roles: &[&str]) -> String {
        let claims = json!({
            "sub": "6c5b7a3e-8f3f-4b8e-9d3c-2a1f0e9d8c7b",
            "roles": roles,
            "exp": (DateTime::now() + expires_in).unix_timestamp(),
        });
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn command(token: String) -> AuthorizeUserSession {
        #[expect(unsafe_code, reason = "test")]
        let token = unsafe { session::Token::new_unchecked(token) };
        AuthorizeUserSession { token }
    }

    #[tokio::test]
    async fn authorizes_valid_token() {
        let service = fixture::service();

        let session = service
            .execute(command(token(
                fixture::JWT_SECRET,
                fixture::HOUR,
                &["ADMIN", "AUDITOR"],
            )))
            .await
            .unwrap();

        assert_eq!(
            session.user_id.to_string(),
            "6c5b7a3e-8f3f-4b8e-9d3c-2a1f0e9d8c7b",
        );
        assert!(session.is_admin());
        assert!(!session.has_role(user::Role::Customer));
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let service = fixture::service();

        let res = service
            .execute(command(token(b"other-secret", fixture::HOUR, &[])))
            .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let service = fixture::service();
        let claims = json!({
            "sub": "6c5b7a3e-8f3f-4b8e-9d3c-2a1f0e9d8c7b",
            "exp": (DateTime::now() - fixture::HOUR).unix_timestamp(),
        });
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(fixture::JWT_SECRET),
        )
        .unwrap();

        let res = service.execute(command(token)).await;

        assert!(res.is_err());
    }
}
