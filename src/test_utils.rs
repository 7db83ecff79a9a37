//! Helpers shared by the unit tests.

use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, CategoryId, PasswordHash, User, UserID, ValidatedPassword, auth::create_user,
    db::initialize,
};

/// The password given to [create_test_user].
pub const TEST_PASSWORD: &str = "averysafeandsecurepassword";
/// The email given to [create_test_user].
pub const TEST_EMAIL: &str = "test@example.com";
/// The shared secret configured by [get_test_state].
pub const TEST_CRON_SECRET: &str = "let-the-cron-in";

/// An in-memory database with every table created.
pub fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with [TEST_EMAIL] and [TEST_PASSWORD].
///
/// The password is hashed with the lowest bcrypt cost to keep tests fast.
pub fn create_test_user(connection: &Connection) -> User {
    create_user_with_email(TEST_EMAIL, connection)
}

/// Insert a user with [TEST_PASSWORD] and the given email.
pub fn create_user_with_email(email: &str, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash password");

    create_user(
        EmailAddress::from_str(email).expect("Invalid test email"),
        password_hash,
        connection,
    )
    .expect("Could not create test user")
}

/// App state backed by an in-memory database in UTC.
pub fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "42", TEST_CRON_SECRET, "Etc/UTC")
        .expect("Could not create app state")
}

/// Insert a recurring category that is next due on `next_date`.
///
/// Bypasses the schedule rules so tests can place the next date anywhere.
pub fn insert_recurring_category(
    user_id: Option<UserID>,
    day: u8,
    amount: f64,
    next_date: Date,
    connection: &Connection,
) -> CategoryId {
    connection
        .execute(
            "INSERT INTO category
                (user_id, name, type, registration_date, registration_next_date, amount)
            VALUES (?1, 'Rent', 'expense', ?2, ?3, ?4)",
            (user_id.map(|id| id.as_i64()), day, next_date, amount),
        )
        .expect("Could not insert recurring category");

    connection.last_insert_rowid()
}
