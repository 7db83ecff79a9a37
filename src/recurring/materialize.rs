//! Creates the transactions for the recurring categories due on a given day.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::Date;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    Error,
    category::{CATEGORY_COLUMNS, CategoryId, RegistrationDay, map_category_row},
    recurring::add_one_month,
    transaction::{NewTransaction, TransactionId, create_transaction},
};

/// The memo given to transactions created for recurring categories.
pub const RECURRING_MEMO: &str = "recurring";

/// How many recurring categories are processed at the same time by default.
pub const DEFAULT_RECURRING_CONCURRENCY: usize = 4;

/// A transaction created for a recurring category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedTransaction {
    /// The category that fired.
    pub category_id: CategoryId,
    /// The transaction that was created.
    pub transaction_id: TransactionId,
    /// The date the category fires on next.
    pub next_date: Date,
}

/// A recurring category that could not be processed.
///
/// The category is left as it was, so it is retried on the next run that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryFailure {
    /// The category that failed.
    pub category_id: CategoryId,
    /// Why it failed.
    pub error: String,
}

/// The overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No categories were due.
    NothingDue,
    /// Every due category was processed.
    Completed,
    /// At least one due category failed.
    PartialFailure,
}

/// What happened to each category that was due on `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializeReport {
    /// The day the run was for.
    pub date: Date,
    /// Categories that fired, ordered by category ID.
    pub created: Vec<CreatedTransaction>,
    /// Categories that were no longer due by the time they were processed,
    /// e.g. because another run got to them first.
    pub skipped: Vec<CategoryId>,
    /// Categories that failed, ordered by category ID.
    pub failed: Vec<CategoryFailure>,
}

impl MaterializeReport {
    fn empty(date: Date) -> Self {
        Self {
            date,
            created: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Summarise the run.
    pub fn status(&self) -> JobStatus {
        if !self.failed.is_empty() {
            JobStatus::PartialFailure
        } else if self.created.is_empty() && self.skipped.is_empty() {
            JobStatus::NothingDue
        } else {
            JobStatus::Completed
        }
    }
}

/// The result of firing a single category.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// The transaction was created and the next date moved on.
    Created(CreatedTransaction),
    /// The category was archived, edited or already fired since it was found to be due.
    NoLongerDue,
}

/// The IDs of the active categories whose next date is exactly `today`.
///
/// Categories with a next date in the past are not included.
pub fn get_due_category_ids(
    today: Date,
    connection: &Connection,
) -> Result<Vec<CategoryId>, Error> {
    connection
        .prepare(
            "SELECT id FROM category
            WHERE is_deleted = 0 AND registration_next_date = ?1
            ORDER BY id ASC",
        )?
        .query_map((today,), |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

/// Create today's transaction for a recurring category and move its next
/// date on by one month.
///
/// Both writes happen in one database transaction that takes the write lock
/// before the category is read, so the category either fires completely or
/// not at all, and never fires twice for the same day.
///
/// # Errors
///
/// Returns an error if the category has no owner or amount, or if a write
/// fails. Nothing is changed in that case.
pub fn fire_recurring_category(
    category_id: CategoryId,
    today: Date,
    connection: &Connection,
) -> Result<FireOutcome, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let category = transaction
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
            WHERE id = ?1 AND is_deleted = 0 AND registration_next_date = ?2"
        ))?
        .query_row((category_id, today), map_category_row)
        .optional()?;

    let Some(category) = category else {
        return Ok(FireOutcome::NoLongerDue);
    };

    let user_id = category
        .user_id
        .ok_or(Error::MissingCategoryOwner(category_id))?;
    let amount = category.amount.ok_or(Error::MissingRecurringAmount)?;
    let anchor_day = match category.registration_date {
        Some(day) => day,
        None => RegistrationDay::new(today.day())?,
    };
    let next_date = add_one_month(today, anchor_day)?;

    let created = create_transaction(
        &NewTransaction {
            user_id,
            category_id,
            date: today,
            amount,
            transaction_type: category.category_type,
            memo: RECURRING_MEMO.to_owned(),
        },
        &transaction,
    )?;

    let rows_affected = transaction.execute(
        "UPDATE category SET registration_next_date = ?1
        WHERE id = ?2 AND registration_next_date = ?3",
        (next_date, category_id, today),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    transaction.commit()?;

    Ok(FireOutcome::Created(CreatedTransaction {
        category_id,
        transaction_id: created.id,
        next_date,
    }))
}

/// Fire every recurring category due on `today`.
///
/// Categories are processed independently, at most `concurrency` at a time,
/// with the database work running on the blocking thread pool. A failure is
/// recorded in the report and does not stop the other categories.
///
/// # Errors
///
/// Returns an error only if the due categories could not be looked up.
pub async fn materialize_recurring_categories(
    today: Date,
    db_connection: Arc<Mutex<Connection>>,
    concurrency: usize,
) -> Result<MaterializeReport, Error> {
    let connection = db_connection.clone();
    let due_ids = tokio::task::spawn_blocking(move || -> Result<Vec<CategoryId>, Error> {
        let connection = connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_due_category_ids(today, &connection)
    })
    .await
    .map_err(|error| Error::BackgroundTaskFailed(error.to_string()))??;

    let mut report = MaterializeReport::empty(today);

    if due_ids.is_empty() {
        tracing::info!("No recurring categories are due on {today}");
        return Ok(report);
    }

    tracing::info!(
        "Processing {} recurring categories due on {today}",
        due_ids.len()
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for &category_id in &due_ids {
        let semaphore = semaphore.clone();
        let db_connection = db_connection.clone();

        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => tokio::task::spawn_blocking(move || -> Result<FireOutcome, Error> {
                    let connection = db_connection
                        .lock()
                        .inspect_err(|error| {
                            tracing::error!("could not acquire database lock: {error}")
                        })
                        .map_err(|_| Error::DatabaseLockError)?;

                    fire_recurring_category(category_id, today, &connection)
                })
                .await
                .unwrap_or_else(|error| Err(Error::BackgroundTaskFailed(error.to_string()))),
                Err(error) => Err(Error::BackgroundTaskFailed(error.to_string())),
            };

            (category_id, result)
        });
    }

    let mut reported = HashSet::new();

    while let Some(joined) = tasks.join_next().await {
        let (category_id, result) = match joined {
            Ok(output) => output,
            Err(error) => {
                tracing::error!("A recurring category task did not finish: {error}");
                continue;
            }
        };
        reported.insert(category_id);

        match result {
            Ok(FireOutcome::Created(created)) => {
                tracing::info!(
                    "Created transaction {} for recurring category {category_id}, next due on {}",
                    created.transaction_id,
                    created.next_date
                );
                report.created.push(created);
            }
            Ok(FireOutcome::NoLongerDue) => {
                tracing::info!("Skipped recurring category {category_id}, it is no longer due");
                report.skipped.push(category_id);
            }
            Err(error) => {
                tracing::warn!(
                    "Could not create recurring transaction for category {category_id}: {error}"
                );
                report.failed.push(CategoryFailure {
                    category_id,
                    error: error.to_string(),
                });
            }
        }
    }

    for category_id in due_ids {
        if !reported.contains(&category_id) {
            report.failed.push(CategoryFailure {
                category_id,
                error: Error::BackgroundTaskFailed("the task did not finish".to_owned())
                    .to_string(),
            });
        }
    }

    report.created.sort_by_key(|created| created.category_id);
    report.skipped.sort_unstable();
    report.failed.sort_by_key(|failure| failure.category_id);

    tracing::info!(
        "Recurring run for {today} finished: {} created, {} skipped, {} failed",
        report.created.len(),
        report.skipped.len(),
        report.failed.len()
    );

    Ok(report)
}

#[cfg(test)]
mod fire_recurring_category_tests {
    use time::macros::date;

    use crate::{
        Error,
        category::CategoryType,
        recurring::{FireOutcome, RECURRING_MEMO, fire_recurring_category},
        test_utils::{create_test_user, get_test_connection, insert_recurring_category},
        transaction::get_transaction,
    };

    #[test]
    fn fires_due_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category_id = insert_recurring_category(
            Some(user.id),
            15,
            500.0,
            date!(2024 - 03 - 15),
            &connection,
        );

        let outcome = fire_recurring_category(category_id, date!(2024 - 03 - 15), &connection);

        let created = match outcome {
            Ok(FireOutcome::Created(created)) => created,
            other => panic!("want a created transaction, got {other:?}"),
        };
        assert_eq!(created.next_date, date!(2024 - 04 - 15));
        let transaction = get_transaction(created.transaction_id, user.id, &connection).unwrap();
        assert_eq!(transaction.category_id, category_id);
        assert_eq!(transaction.amount, 500.0);
        assert_eq!(transaction.transaction_type, CategoryType::Expense);
        assert_eq!(transaction.date, date!(2024 - 03 - 15));
        assert_eq!(transaction.memo, RECURRING_MEMO);
    }

    #[test]
    fn category_not_due_is_skipped() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category_id = insert_recurring_category(
            Some(user.id),
            15,
            500.0,
            date!(2024 - 04 - 15),
            &connection,
        );

        let outcome = fire_recurring_category(category_id, date!(2024 - 03 - 15), &connection);

        assert_eq!(outcome, Ok(FireOutcome::NoLongerDue));
    }

    #[test]
    fn category_without_owner_fails() {
        let connection = get_test_connection();
        let category_id =
            insert_recurring_category(None, 15, 500.0, date!(2024 - 03 - 15), &connection);

        let outcome = fire_recurring_category(category_id, date!(2024 - 03 - 15), &connection);

        assert_eq!(outcome, Err(Error::MissingCategoryOwner(category_id)));
    }

    #[test]
    fn missing_anchor_day_uses_due_date() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        connection
            .execute(
                "INSERT INTO category (user_id, name, type, registration_next_date, amount)
                VALUES (?1, 'Legacy', 'income', '2024-03-31', 100.0)",
                (user.id.as_i64(),),
            )
            .unwrap();
        let category_id = connection.last_insert_rowid();

        let outcome = fire_recurring_category(category_id, date!(2024 - 03 - 31), &connection);

        let created = match outcome {
            Ok(FireOutcome::Created(created)) => created,
            other => panic!("want a created transaction, got {other:?}"),
        };
        assert_eq!(created.next_date, date!(2024 - 04 - 30));
    }
}
