//! Moneyflow is a JSON API for tracking personal income and expenses.
//!
//! Users sort their transactions into income and expense categories. A
//! category can be made recurring, in which case an external scheduler calls
//! the recurring transaction endpoint once a day and a transaction is created
//! for every category that is due.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod db;
mod endpoints;
mod extract;
mod logging;
mod not_found;
mod recurring;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    AuthContext, PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_email,
    update_password,
};
pub use category::{
    Category, CategoryForm, CategoryId, CategoryName, CategoryType, NewCategory, RegistrationDay,
    create_category, delete_category, get_categories, get_category, permanently_delete_category,
    update_category,
};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use recurring::{
    CategoryFailure, CreatedTransaction, CronSecret, DEFAULT_RECURRING_CONCURRENCY, FireOutcome,
    JobStatus, MaterializeReport, RECURRING_MEMO, add_one_month, fire_recurring_category,
    get_due_category_ids, materialize_recurring_categories, next_registration_date,
};
pub use routing::build_router;
pub use timezone::local_today;
pub use transaction::{
    DateWindow, MonthlyCategoryTotal, NewTransaction, Transaction, TransactionForm, TransactionId,
    WindowQuery, create_transaction, delete_transaction, get_monthly_summary, get_transaction,
    get_transactions_in_window, update_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The request did not carry a valid, unexpired auth cookie.
    #[error("you must be logged in to access this resource")]
    NotAuthenticated,

    /// The recurring transaction trigger was called without the shared secret.
    #[error("invalid or missing cron credentials")]
    CronUnauthorized,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address could not be parsed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A recurring category was given a day of the month outside of 1-31.
    #[error("{0} is not a valid day of the month, expected a number from 1 to 31")]
    InvalidRegistrationDay(u8),

    /// A recurring category was created without the amount to post.
    #[error("recurring categories must have an amount")]
    MissingRecurringAmount,

    /// A recurring category has no owner, so its transactions cannot be attributed to a user.
    #[error("category {0} has no owner and cannot create recurring transactions")]
    MissingCategoryOwner(CategoryId),

    /// Amounts must be finite numbers greater than zero.
    #[error("{0} is not a valid amount, expected a number greater than zero")]
    InvalidAmount(f64),

    /// The category ID used for a transaction does not refer to an active
    /// category the user can see.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// Tried to permanently delete a category that transactions still refer to.
    #[error("the category still has transactions, delete them or archive the category instead")]
    CategoryInUse,

    /// The request body, path or query could not be read.
    ///
    /// `status` is the status axum would have used for the rejection.
    #[error("{message}")]
    InvalidRequest {
        /// The HTTP status for the rejection.
        status: StatusCode,
        /// Why the request could not be read.
        message: String,
    },

    /// A month or year query could not be parsed.
    #[error("invalid date window \"{0}\", expected YYYY, YYYY-MM or YYYY-MM-DD")]
    InvalidWindow(String),

    /// Date arithmetic went past the supported calendar range.
    #[error("the date is outside of the supported range")]
    DateOutOfRange,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A background task panicked or was cancelled before it finished.
    #[error("a background task failed: {0}")]
    BackgroundTaskFailed(String),

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::NotAuthenticated | Error::CronUnauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Error::TooWeak(_)
            | Error::InvalidEmail(_)
            | Error::EmptyCategoryName
            | Error::InvalidRegistrationDay(_)
            | Error::MissingRecurringAmount
            | Error::InvalidAmount(_)
            | Error::InvalidCategory(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidRequest { status, .. } => *status,
            Error::InvalidWindow(_) | Error::DateOutOfRange => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail | Error::CategoryInUse => StatusCode::CONFLICT,
            Error::NotFound
            | Error::UpdateMissingCategory
            | Error::DeleteMissingCategory
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
