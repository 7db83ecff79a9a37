//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, NewCategory},
    recurring::next_registration_date,
};

/// The columns read by [map_category_row], in order.
pub(crate) const CATEGORY_COLUMNS: &str = "id, user_id, name, type, description, is_deleted, \
     registration_date, registration_next_date, amount";

/// Create a category owned by `user_id` and return it with its generated ID.
///
/// A recurring category gets its first firing date from `today`, see
/// [next_registration_date].
///
/// # Errors
///
/// Returns an error if the first firing date is out of range or the insert
/// fails.
pub fn create_category(
    user_id: Option<UserID>,
    category: &NewCategory,
    today: Date,
    connection: &Connection,
) -> Result<Category, Error> {
    let registration_next_date = category
        .registration_date
        .map(|day| next_registration_date(today, day))
        .transpose()?;

    connection.execute(
        "INSERT INTO category
            (user_id, name, type, description, registration_date, registration_next_date, amount)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.map(|id| id.as_i64()),
            category.name.as_ref(),
            category.category_type,
            &category.description,
            category.registration_date,
            registration_next_date,
            category.amount,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name: category.name.clone(),
        category_type: category.category_type,
        description: category.description.clone(),
        is_deleted: false,
        registration_date: category.registration_date,
        registration_next_date,
        amount: category.amount,
    })
}

/// Retrieve an active category owned by `user_id` or shared by every user.
///
/// # Errors
///
/// Returns [Error::NotFound] if the category does not exist, is archived, or
/// belongs to someone else.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
            WHERE id = ?1 AND is_deleted = 0 AND (user_id = ?2 OR user_id IS NULL)"
        ))?
        .query_row((category_id, user_id.as_i64()), map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve the active categories visible to `user_id`, income first, then by name.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
            WHERE is_deleted = 0 AND (user_id = ?1 OR user_id IS NULL)
            ORDER BY CASE type WHEN 'income' THEN 0 WHEN 'expense' THEN 1 ELSE 2 END, name ASC"
        ))?
        .query_map((user_id.as_i64(),), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of a category and return the updated category.
///
/// The next firing date is kept while the recurrence day stays the same. It
/// is recalculated from `today` when the day changes or recurrence is turned
/// on, and cleared when recurrence is turned off.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the category is not visible to
/// `user_id` or is archived.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    category: &NewCategory,
    today: Date,
    connection: &Connection,
) -> Result<Category, Error> {
    let transaction = connection.unchecked_transaction()?;

    let current = match get_category(category_id, user_id, &transaction) {
        Ok(current) => current,
        Err(Error::NotFound) => return Err(Error::UpdateMissingCategory),
        Err(error) => return Err(error),
    };

    let registration_next_date = match (category.registration_date, current.registration_date) {
        (None, _) => None,
        (Some(new_day), Some(old_day))
            if new_day == old_day && current.registration_next_date.is_some() =>
        {
            current.registration_next_date
        }
        (Some(new_day), _) => Some(next_registration_date(today, new_day)?),
    };

    let rows_affected = transaction.execute(
        "UPDATE category
        SET name = ?1, type = ?2, description = ?3, registration_date = ?4,
            registration_next_date = ?5, amount = ?6
        WHERE id = ?7",
        (
            category.name.as_ref(),
            category.category_type,
            &category.description,
            category.registration_date,
            registration_next_date,
            category.amount,
            category_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    transaction.commit()?;

    Ok(Category {
        id: category_id,
        user_id: current.user_id,
        name: category.name.clone(),
        category_type: category.category_type,
        description: category.description.clone(),
        is_deleted: false,
        registration_date: category.registration_date,
        registration_next_date,
        amount: category.amount,
    })
}

/// Archive a category so that it is hidden and never fires again.
///
/// Transactions in the category are kept.
///
/// # Errors
///
/// Returns [Error::DeleteMissingCategory] if the category is not visible to
/// `user_id` or is already archived.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET is_deleted = 1
        WHERE id = ?1 AND is_deleted = 0 AND (user_id = ?2 OR user_id IS NULL)",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Remove a category from the database.
///
/// Archived categories can be removed too.
///
/// # Errors
///
/// Returns [Error::CategoryInUse] if any transaction refers to the category
/// and [Error::DeleteMissingCategory] if it is not visible to `user_id`.
pub fn permanently_delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    let visible: bool = transaction.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM category WHERE id = ?1 AND (user_id = ?2 OR user_id IS NULL)
        )",
        (category_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if !visible {
        return Err(Error::DeleteMissingCategory);
    }

    let in_use: bool = transaction.query_row(
        "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE category_id = ?1)",
        (category_id,),
        |row| row.get(0),
    )?;

    if in_use {
        return Err(Error::CategoryInUse);
    }

    let rows_affected = transaction
        .execute(
            "DELETE FROM category WHERE id = ?1 AND (user_id = ?2 OR user_id IS NULL)",
            (category_id, user_id.as_i64()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code:
                        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER,
                },
                _,
            ) => Error::CategoryInUse,
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            name TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT '',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            registration_date INTEGER CHECK (registration_date BETWEEN 1 AND 31),
            registration_next_date TEXT,
            amount REAL,
            CHECK (registration_next_date IS NULL OR amount IS NOT NULL)
        );

        CREATE INDEX IF NOT EXISTS idx_category_due
            ON category(registration_next_date, is_deleted);",
    )?;

    Ok(())
}

/// Map a row selected with [CATEGORY_COLUMNS] to a [Category].
pub(crate) fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: row.get::<_, Option<i64>>(1)?.map(UserID::new),
        name: CategoryName::new_unchecked(&raw_name),
        category_type: row.get(3)?,
        description: row.get(4)?,
        is_deleted: row.get(5)?,
        registration_date: row.get(6)?,
        registration_next_date: row.get(7)?,
        amount: row.get(8)?,
    })
}
