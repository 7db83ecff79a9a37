//! The endpoint for logging in with an email and password.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_email, set_auth_cookie},
    extract::Json,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The body of a log-in request.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password in the database, which has been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
    /// Whether to extend the initial auth cookie duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// The body of a successful log-in response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedIn {
    /// The ID of the user that logged in.
    pub user_id: UserID,
}

/// Handler for log-in requests.
///
/// On success the auth cookie is set. An unknown email and a wrong password
/// produce the same [Error::InvalidCredentials] so the response does not
/// reveal which accounts exist.
///
/// # Errors
///
/// Returns an error if the credentials are wrong or an internal error
/// occurred while verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<(StatusCode, PrivateCookieJar, Json<LoggedIn>), Error> {
    let email =
        EmailAddress::from_str(user_data.email.trim()).map_err(|_| Error::InvalidCredentials)?;

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&user_data.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        tracing::info!("Failed log-in attempt for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((StatusCode::OK, jar, Json(LoggedIn { user_id: user.id })))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::PrivateCookieJar;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, cookie::get_token_from_cookies},
        extract::Json,
        test_utils::{TEST_EMAIL, TEST_PASSWORD, create_test_user, get_test_connection},
    };

    use super::{LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION, post_log_in};

    fn get_state() -> LoginState {
        let connection = get_test_connection();
        create_test_user(&connection);

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn log_in_data(email: &str, password: &str, remember_me: bool) -> Json<LogInData> {
        Json(LogInData {
            email: email.to_owned(),
            password: password.to_owned(),
            remember_me,
        })
    }

    #[tokio::test]
    async fn log_in_sets_auth_cookie() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let (status, jar, Json(body)) = post_log_in(
            State(state),
            jar,
            log_in_data(TEST_EMAIL, TEST_PASSWORD, false),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::OK);
        let token = get_token_from_cookies(&jar).unwrap();
        assert_eq!(token.user_id, body.user_id);
        let remaining = token.expires_at - OffsetDateTime::now_utc();
        assert!(remaining <= DEFAULT_COOKIE_DURATION);
        assert!(remaining > DEFAULT_COOKIE_DURATION - Duration::minutes(1));
    }

    #[tokio::test]
    async fn remember_me_extends_cookie() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let (_, jar, _) = post_log_in(
            State(state),
            jar,
            log_in_data(TEST_EMAIL, TEST_PASSWORD, true),
        )
        .await
        .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        let remaining = token.expires_at - OffsetDateTime::now_utc();
        assert!(remaining > REMEMBER_ME_COOKIE_DURATION - Duration::minutes(1));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            log_in_data(TEST_EMAIL, "wrongpassword", false),
        )
        .await;

        assert_eq!(result.map(|_| ()).unwrap_err(), Error::InvalidCredentials);
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar,
            log_in_data("nobody@example.com", TEST_PASSWORD, false),
        )
        .await;

        assert_eq!(result.map(|_| ()).unwrap_err(), Error::InvalidCredentials);
    }

    #[tokio::test]
    async fn failed_log_in_does_not_set_cookie() {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let result = post_log_in(
            State(state),
            jar.clone(),
            log_in_data(TEST_EMAIL, "wrongpassword", false),
        )
        .await;

        assert!(result.is_err());
        assert!(jar.get(COOKIE_TOKEN).is_none());
    }
}
