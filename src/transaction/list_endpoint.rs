//! Endpoints for reading transactions.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    extract::{Json, Path, Query},
    timezone::local_today,
    transaction::{
        DateWindow, Transaction, TransactionId, WindowQuery, get_transaction,
        get_transactions_in_window,
    },
};

/// The state needed for reading transactions.
#[derive(Debug, Clone)]
pub struct TransactionListState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the logged in user's transactions in a month or year.
///
/// Defaults to the current month in the local timezone.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionListState>,
    auth: AuthContext,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let current_month = DateWindow::month_of(local_today(&state.local_timezone)?)?;
    let window = query.window_or(current_month)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions_in_window(auth.user_id, window, &connection).map(Json)
}

/// Get one of the logged in user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionListState>,
    auth: AuthContext,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(transaction_id, auth.user_id, &connection).map(Json)
}

#[cfg(test)]
mod list_transactions_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use time::{Date, macros::date};

    use crate::{
        Error,
        auth::AuthContext,
        category::{CategoryName, CategoryType, NewCategory, create_category},
        extract::{Json, Query},
        test_utils::{create_test_user, get_test_connection},
        timezone::local_today,
        transaction::{NewTransaction, WindowQuery, create_transaction},
    };

    use super::{TransactionListState, list_transactions_endpoint};

    fn setup(dates: &[Date]) -> (TransactionListState, AuthContext) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense),
            date!(2024 - 01 - 01),
            &connection,
        )
        .unwrap();
        for &date in dates {
            create_transaction(
                &NewTransaction {
                    user_id: user.id,
                    category_id: category.id,
                    date,
                    amount: 1.0,
                    transaction_type: CategoryType::Expense,
                    memo: String::new(),
                },
                &connection,
            )
            .unwrap();
        }

        (
            TransactionListState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(connection)),
            },
            AuthContext { user_id: user.id },
        )
    }

    #[tokio::test]
    async fn lists_requested_month() {
        let (state, auth) = setup(&[date!(2024 - 03 - 02), date!(2024 - 04 - 02)]);
        let query = WindowQuery {
            month: Some("2024-03".to_owned()),
            year: None,
        };

        let Json(transactions) = list_transactions_endpoint(State(state), auth, Query(query))
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].date, date!(2024 - 03 - 02));
    }

    #[tokio::test]
    async fn lists_requested_year() {
        let (state, auth) = setup(&[
            date!(2023 - 12 - 31),
            date!(2024 - 03 - 02),
            date!(2024 - 12 - 31),
        ]);
        let query = WindowQuery {
            month: None,
            year: Some("2024".to_owned()),
        };

        let Json(transactions) = list_transactions_endpoint(State(state), auth, Query(query))
            .await
            .unwrap();

        assert_eq!(transactions.len(), 2);
    }

    #[tokio::test]
    async fn defaults_to_current_month() {
        let today = local_today("Etc/UTC").unwrap();
        let (state, auth) = setup(&[today, date!(2000 - 01 - 01)]);

        let Json(transactions) =
            list_transactions_endpoint(State(state), auth, Query(WindowQuery::default()))
                .await
                .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].date, today);
    }

    #[tokio::test]
    async fn invalid_window_is_rejected() {
        let (state, auth) = setup(&[]);
        let query = WindowQuery {
            month: Some("March".to_owned()),
            year: None,
        };

        let result = list_transactions_endpoint(State(state), auth, Query(query)).await;

        assert_eq!(
            result.map(|_| ()),
            Err(Error::InvalidWindow("March".to_owned()))
        );
    }
}
