//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    category::{CategoryId, CategoryType},
    transaction::DateWindow,
};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned, always above zero.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: CategoryType,
    /// A text note, "recurring" for transactions created by the recurring job.
    pub memo: String,
}

/// The fields of a transaction that is about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// Whether the money was earned or spent.
    pub transaction_type: CategoryType,
    /// A text note.
    pub memo: String,
}

/// The request body for creating or updating a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    /// When the transaction happened, e.g. "2024-03-15".
    pub date: Date,
    /// The amount of money spent or earned.
    pub amount: f64,
    /// Income or expense. Defaults to the category's type.
    #[serde(default, rename = "type")]
    pub transaction_type: Option<CategoryType>,
    /// The category the transaction belongs to.
    #[serde(alias = "categoryId")]
    pub category_id: CategoryId,
    /// A text note.
    #[serde(default)]
    pub memo: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Insert a transaction and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::InvalidCategory] if the category does not exist.
pub fn create_transaction(
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, category_id, date, amount, type, memo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, category_id, date, amount, type, memo",
        )?
        .query_row(
            (
                transaction.user_id.as_i64(),
                transaction.category_id,
                transaction.date,
                transaction.amount,
                transaction.transaction_type,
                &transaction.memo,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(transaction.category_id),
            error => error.into(),
        })
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, date, amount, type, memo FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve the transactions owned by `user_id` inside `window`, ordered by
/// date then ID.
pub fn get_transactions_in_window(
    user_id: UserID,
    window: DateWindow,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, date, amount, type, memo FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date < ?3
             ORDER BY date ASC, id ASC",
        )?
        .query_map(
            (user_id.as_i64(), window.start, window.end),
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of a transaction owned by `transaction.user_id`.
///
/// # Errors
///
/// Returns [Error::UpdateMissingTransaction] if the transaction does not
/// exist or belongs to another user, and [Error::InvalidCategory] if the new
/// category does not exist.
pub fn update_transaction(
    id: TransactionId,
    transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE \"transaction\"
             SET category_id = ?1, date = ?2, amount = ?3, type = ?4, memo = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                transaction.category_id,
                transaction.date,
                transaction.amount,
                transaction.transaction_type,
                &transaction.memo,
                id,
                transaction.user_id.as_i64(),
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(transaction.category_id),
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    Ok(Transaction {
        id,
        user_id: transaction.user_id,
        category_id: transaction.category_id,
        date: transaction.date,
        amount: transaction.amount,
        transaction_type: transaction.transaction_type,
        memo: transaction.memo.clone(),
    })
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the transaction does not
/// exist or belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL
                REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            category_id INTEGER NOT NULL
                REFERENCES category(id) ON UPDATE CASCADE,
            date TEXT NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            memo TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let category_id = row.get(2)?;
    let date = row.get(3)?;
    let amount = row.get(4)?;
    let transaction_type = row.get(5)?;
    let memo = row.get(6)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        date,
        amount,
        transaction_type,
        memo,
    })
}

// ============================================================================
// TESTS
// ============================================================================
