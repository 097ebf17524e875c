//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::user::{session, Session},
};
use tokio::sync::OnceCell;

use crate::{api, define_error, AsError, Error, JuniperResponse, Service};

/// Context of a single GraphQL request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`http::StatusCode`] of the response, in case it fails.
    error_status_code: AtomicU16,

    /// `Authorization` header of the HTTP request, if any.
    authorization: Result<Option<session::Token>, Error>,

    /// Outcome of authenticating the request, resolved at most once.
    session: OnceCell<Result<Session, Error>>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`http::StatusCode`] to respond with on errors.
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Helper returning a closure for [`Result::map_err()`], which makes the
    /// response carry the [`http::StatusCode`] of the passed [`Error`].
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.error_status_code
                .store(err.status_code.as_u16(), atomic::Ordering::Relaxed);
            err
        }
    }

    /// Returns the [`Session`] the request is authorized with.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided authentication token is invalid or expired.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.session
            .get_or_init(|| self.authenticate())
            .await
            .clone()
            .map_err(self.error())
    }

    /// Returns the [`Session`] the request is authorized with, checking it
    /// belongs to an administrator.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided authentication token is invalid or expired;
    /// - the authenticated user is not an administrator.
    pub async fn admin_session(&self) -> Result<Session, Error> {
        let session = self.current_session().await?;
        if !session.is_admin() {
            return Err(self.error()(api::PrivilegeError::Admin.into()));
        }
        Ok(session)
    }

    async fn authenticate(&self) -> Result<Session, Error> {
        let token = self
            .authorization
            .clone()?
            .ok_or_else(|| Error::from(AuthError::AuthorizationRequired))?;

        self.service
            .execute(command::AuthorizeUserSession { token })
            .await
            .map_err(AsError::into_error)
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        let authorization = match parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
        {
            Ok(TypedHeader(Authorization(bearer))) => {
                #[expect(unsafe_code, reason = "specified in correct header")]
                let token = unsafe {
                    session::Token::new_unchecked(bearer.token().to_owned())
                };
                Ok(Some(token))
            }
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e.into_error()),
        };

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            authorization,
            session: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenDecodeError(_) => {
                Some(AuthError::InvalidToken.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization token is invalid or expired"]
        InvalidToken,
    }
}
