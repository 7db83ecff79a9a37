//! The endpoint for changing a transaction.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    extract::{Json, Path},
    transaction::{
        Transaction, TransactionForm, TransactionId, create_endpoint::resolve_update_form,
        get_transaction, update_transaction,
    },
};

/// The state needed for updating a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace the fields of one of the logged in user's transactions.
///
/// A transaction whose category has been archived can still be edited as
/// long as it stays in that category.
pub async fn update_transaction_endpoint(
    State(state): State<EditTransactionState>,
    auth: AuthContext,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let current = match get_transaction(transaction_id, auth.user_id, &connection) {
        Ok(current) => current,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    let changes = resolve_update_form(form, &current, &connection)?;

    update_transaction(transaction_id, &changes, &connection).map(Json)
}

#[cfg(test)]
mod update_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use time::macros::date;

    use crate::{
        Error,
        auth::AuthContext,
        category::{CategoryName, CategoryType, NewCategory, create_category, delete_category},
        extract::{Json, Path},
        test_utils::{create_test_user, create_user_with_email, get_test_connection},
        transaction::{NewTransaction, TransactionForm, create_transaction, get_transaction},
    };

    use super::{EditTransactionState, update_transaction_endpoint};

    #[tokio::test]
    async fn updates_only_own_transactions() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let other_user = create_user_with_email("other@example.com", &connection);
        let category = create_category(
            None,
            &NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense),
            date!(2024 - 01 - 01),
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            &NewTransaction {
                user_id: user.id,
                category_id: category.id,
                date: date!(2024 - 03 - 15),
                amount: 10.0,
                transaction_type: CategoryType::Expense,
                memo: String::new(),
            },
            &connection,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let form = TransactionForm {
            date: date!(2024 - 03 - 16),
            amount: 20.0,
            transaction_type: None,
            category_id: category.id,
            memo: Some("dinner".to_owned()),
        };

        let stolen = update_transaction_endpoint(
            State(state.clone()),
            AuthContext {
                user_id: other_user.id,
            },
            Path(transaction.id),
            Json(form.clone()),
        )
        .await;
        let Json(updated) = update_transaction_endpoint(
            State(state.clone()),
            AuthContext { user_id: user.id },
            Path(transaction.id),
            Json(form),
        )
        .await
        .unwrap();

        assert_eq!(stolen.map(|_| ()), Err(Error::UpdateMissingTransaction));
        assert_eq!(updated.amount, 20.0);
        assert_eq!(updated.memo, "dinner");
        assert_eq!(
            get_transaction(transaction.id, user.id, &state.db_connection.lock().unwrap()),
            Ok(updated)
        );
    }

    #[tokio::test]
    async fn keeps_archived_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense),
            date!(2024 - 01 - 01),
            &connection,
        )
        .unwrap();
        let transaction = create_transaction(
            &NewTransaction {
                user_id: user.id,
                category_id: category.id,
                date: date!(2024 - 03 - 15),
                amount: 10.0,
                transaction_type: CategoryType::Expense,
                memo: String::new(),
            },
            &connection,
        )
        .unwrap();
        delete_category(category.id, user.id, &connection).unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let Json(updated) = update_transaction_endpoint(
            State(state),
            AuthContext { user_id: user.id },
            Path(transaction.id),
            Json(TransactionForm {
                date: date!(2024 - 03 - 15),
                amount: 10.0,
                transaction_type: None,
                category_id: category.id,
                memo: Some("typo fix".to_owned()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.category_id, category.id);
        assert_eq!(updated.transaction_type, CategoryType::Expense);
        assert_eq!(updated.memo, "typo fix");
    }

    #[tokio::test]
    async fn cannot_move_into_archived_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let food = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense),
            date!(2024 - 01 - 01),
            &connection,
        )
        .unwrap();
        let archived = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Old"), CategoryType::Expense),
            date!(2024 - 01 - 01),
            &connection,
        )
        .unwrap();
        delete_category(archived.id, user.id, &connection).unwrap();
        let transaction = create_transaction(
            &NewTransaction {
                user_id: user.id,
                category_id: food.id,
                date: date!(2024 - 03 - 15),
                amount: 10.0,
                transaction_type: CategoryType::Expense,
                memo: String::new(),
            },
            &connection,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result = update_transaction_endpoint(
            State(state),
            AuthContext { user_id: user.id },
            Path(transaction.id),
            Json(TransactionForm {
                date: date!(2024 - 03 - 15),
                amount: 10.0,
                transaction_type: None,
                category_id: archived.id,
                memo: None,
            }),
        )
        .await;

        assert_eq!(result.map(|_| ()), Err(Error::InvalidCategory(archived.id)));
    }
}
