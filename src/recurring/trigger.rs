//! The endpoint an external scheduler calls once a day to create recurring transactions.

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
};

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{
    AppState, Error,
    recurring::{JobStatus, MaterializeReport, materialize_recurring_categories},
    timezone::local_today,
};

/// The shared secret the scheduler must present as a bearer token.
#[derive(Clone)]
pub struct CronSecret(String);

impl CronSecret {
    /// Wrap the configured secret.
    ///
    /// An empty secret never matches, which disables the trigger.
    pub fn new(secret: &str) -> Self {
        Self(secret.to_owned())
    }

    /// Whether `presented` is the configured secret.
    ///
    /// Both values are hashed first and every byte of the digests is compared,
    /// so the time taken does not depend on where the values differ.
    pub fn matches(&self, presented: &str) -> bool {
        if self.0.is_empty() {
            return false;
        }

        let expected = Sha256::digest(self.0.as_bytes());
        let presented = Sha256::digest(presented.as_bytes());

        expected
            .iter()
            .zip(presented.iter())
            .fold(0u8, |difference, (a, b)| difference | (a ^ b))
            == 0
    }
}

impl Debug for CronSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CronSecret(..)")
    }
}

impl FromRef<AppState> for CronSecret {
    fn from_ref(state: &AppState) -> Self {
        state.cron_secret.clone()
    }
}

/// Proof that the request carried the cron secret.
///
/// Rejects the request with [Error::CronUnauthorized] before the handler runs
/// when the `Authorization: Bearer` header is missing or wrong.
#[derive(Debug, Clone, Copy)]
pub struct CronAuthorized;

impl<S> FromRequestParts<S> for CronAuthorized
where
    CronSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                tracing::warn!("Recurring trigger called without a bearer token");
                Error::CronUnauthorized
            })?;

        if CronSecret::from_ref(state).matches(bearer.token()) {
            Ok(Self)
        } else {
            tracing::warn!("Recurring trigger called with the wrong secret");
            Err(Error::CronUnauthorized)
        }
    }
}

/// The state needed to run the recurring job.
#[derive(Debug, Clone)]
pub struct RecurringTriggerState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The maximum number of categories processed at the same time.
    pub recurring_concurrency: usize,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RecurringTriggerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            recurring_concurrency: state.recurring_concurrency,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the transactions for the recurring categories due today in the
/// local timezone.
///
/// Responds with 500 when any category failed so that the scheduler retries.
/// Retrying is safe because only the categories that are still due are
/// processed again.
pub async fn trigger_recurring_transactions(
    _: CronAuthorized,
    State(state): State<RecurringTriggerState>,
) -> Result<MaterializeReport, Error> {
    let today = local_today(&state.local_timezone)?;

    materialize_recurring_categories(today, state.db_connection, state.recurring_concurrency).await
}

#[derive(Serialize)]
struct ReportResponse<'a> {
    message: &'static str,
    status: JobStatus,
    #[serde(flatten)]
    report: &'a MaterializeReport,
}

impl IntoResponse for MaterializeReport {
    fn into_response(self) -> Response {
        let status = self.status();
        let (status_code, message) = match status {
            JobStatus::NothingDue => (StatusCode::OK, "No recurring transactions for today"),
            JobStatus::Completed => (StatusCode::OK, "Recurring transactions processed"),
            JobStatus::PartialFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Some recurring transactions failed",
            ),
        };

        (
            status_code,
            Json(ReportResponse {
                message,
                status,
                report: &self,
            }),
        )
            .into_response()
    }
}
