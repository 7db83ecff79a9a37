//! The extractor that gives handlers the ID of the logged in user.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{Error, auth::UserID, auth::cookie::get_token_from_cookies};

/// The identity of the user making the request.
///
/// Add this as a handler argument to require a logged in user. Requests
/// without a valid, unexpired auth cookie are rejected with
/// [Error::NotAuthenticated] before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthContext {
    /// The logged in user.
    pub user_id: UserID,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let token = get_token_from_cookies(&jar)?;

        Ok(Self {
            user_id: token.user_id,
        })
    }
}
