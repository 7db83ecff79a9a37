//! Endpoints for archiving and permanently deleting categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    category::{CategoryId, delete_category, permanently_delete_category},
    extract::Path,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Archive a category. Its transactions are kept and it stops recurring.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    auth: AuthContext,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, auth.user_id, &connection)?;
    tracing::info!("User {} archived category {category_id}", auth.user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Remove a category for good. Refused while transactions refer to it.
pub async fn permanently_delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    auth: AuthContext,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    permanently_delete_category(category_id, auth.user_id, &connection)?;
    tracing::info!("User {} deleted category {category_id}", auth.user_id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod delete_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use time::macros::date;

    use crate::{
        Error,
        auth::AuthContext,
        category::{CategoryName, CategoryType, NewCategory, create_category},
        extract::Path,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{DeleteCategoryState, delete_category_endpoint, permanently_delete_category_endpoint};

    fn setup() -> (DeleteCategoryState, AuthContext, i64) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Food"), CategoryType::Expense),
            date!(2024 - 03 - 10),
            &connection,
        )
        .unwrap();

        (
            DeleteCategoryState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            AuthContext { user_id: user.id },
            category.id,
        )
    }

    #[tokio::test]
    async fn archive_returns_no_content() {
        let (state, auth, category_id) = setup();

        let status = delete_category_endpoint(State(state.clone()), auth, Path(category_id)).await;

        assert_eq!(status, Ok(StatusCode::NO_CONTENT));
        let again = delete_category_endpoint(State(state), auth, Path(category_id)).await;
        assert_eq!(again, Err(Error::DeleteMissingCategory));
    }

    #[tokio::test]
    async fn permanent_delete_returns_no_content() {
        let (state, auth, category_id) = setup();

        let status =
            permanently_delete_category_endpoint(State(state), auth, Path(category_id)).await;

        assert_eq!(status, Ok(StatusCode::NO_CONTENT));
    }
}
