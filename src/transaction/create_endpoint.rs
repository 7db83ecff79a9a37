//! The endpoint for recording a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::{HeaderName, StatusCode, header::LOCATION},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    auth::AuthContext,
    category::{CategoryType, get_category, validate_amount},
    endpoints,
    extract::Json,
    transaction::{NewTransaction, Transaction, TransactionForm, create_transaction},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Record a transaction for the logged in user.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    auth: AuthContext,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Transaction>), Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let new_transaction = resolve_form(form, auth.user_id, &connection)?;
    let transaction = create_transaction(&new_transaction, &connection)?;

    let location = endpoints::format_endpoint(endpoints::TRANSACTION, transaction.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(transaction)))
}

/// Validate `form` and fill in the type from its category when it is missing.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] for amounts that are not above zero and
/// [Error::InvalidCategory] if the category is archived or not visible to `user_id`.
pub(super) fn resolve_form(
    form: TransactionForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<NewTransaction, Error> {
    let amount = validate_amount(form.amount)?;
    let category = match get_category(form.category_id, user_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::InvalidCategory(form.category_id)),
        Err(error) => return Err(error),
    };

    Ok(into_new_transaction(
        form,
        user_id,
        amount,
        category.category_type,
    ))
}

/// Like [resolve_form], but a transaction may keep the category it already
/// has even after that category was archived.
///
/// When the category is kept and no type is given, the transaction keeps its
/// current type.
pub(super) fn resolve_update_form(
    form: TransactionForm,
    current: &Transaction,
    connection: &Connection,
) -> Result<NewTransaction, Error> {
    if form.category_id != current.category_id {
        return resolve_form(form, current.user_id, connection);
    }

    let amount = validate_amount(form.amount)?;

    Ok(into_new_transaction(
        form,
        current.user_id,
        amount,
        current.transaction_type,
    ))
}

fn into_new_transaction(
    form: TransactionForm,
    user_id: UserID,
    amount: f64,
    default_type: CategoryType,
) -> NewTransaction {
    NewTransaction {
        user_id,
        category_id: form.category_id,
        date: form.date,
        amount,
        transaction_type: form.transaction_type.unwrap_or(default_type),
        memo: form.memo.unwrap_or_default(),
    }
}
