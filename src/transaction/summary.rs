//! Monthly totals per category.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID,
    auth::AuthContext,
    category::CategoryId,
    extract::{Json, Query},
    timezone::local_today,
    transaction::{DateWindow, WindowQuery},
};

/// The sum of a category's transactions in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCategoryTotal {
    /// The month number, 1 for January.
    pub month: u8,
    /// The category the transactions belong to.
    pub category_id: CategoryId,
    /// The sum of the transaction amounts.
    pub total_amount: f64,
}

/// Sum the transactions owned by `user_id` inside `window` by month and
/// category, ordered by month then category ID.
pub fn get_monthly_summary(
    user_id: UserID,
    window: DateWindow,
    connection: &Connection,
) -> Result<Vec<MonthlyCategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT CAST(strftime('%m', date) AS INTEGER) AS month, category_id,
                SUM(amount) AS total_amount
             FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date < ?3
             GROUP BY month, category_id
             ORDER BY month ASC, category_id ASC",
        )?
        .query_map((user_id.as_i64(), window.start, window.end), |row| {
            Ok(MonthlyCategoryTotal {
                month: row.get(0)?,
                category_id: row.get(1)?,
                total_amount: row.get(2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// The state needed for the summary endpoint.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Monthly totals per category for the logged in user.
///
/// Defaults to the current year in the local timezone.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    auth: AuthContext,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<MonthlyCategoryTotal>>, Error> {
    let current_year = DateWindow::year(local_today(&state.local_timezone)?.year())?;
    let window = query.window_or(current_year)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_monthly_summary(auth.user_id, window, &connection).map(Json)
}
