//! The endpoint for creating a new user account.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash,
    auth::{UserID, create_user},
    extract::Json,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegisterState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The address the user will log in with.
    pub email: String,
    /// The raw password, checked for strength before hashing.
    pub password: String,
}

/// The account that was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// The new user's ID.
    pub id: UserID,
    /// The new user's email address.
    pub email: String,
}

/// Handler for registering a new user.
///
/// # Errors
///
/// Returns an error if the email is not a valid address, the password is too
/// weak, or the email is already registered.
pub async fn register_user(
    State(state): State<RegisterState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<RegisteredUser>), Error> {
    let email = EmailAddress::from_str(form.email.trim())
        .map_err(|error| Error::InvalidEmail(error.to_string()))?;
    let password_hash = PasswordHash::from_raw_password(
        &form.password,
        &[email.as_str()],
        PasswordHash::DEFAULT_COST,
    )?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;
    let user = create_user(email, password_hash, &connection)?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            email: user.email.to_string(),
        }),
    ))
}
