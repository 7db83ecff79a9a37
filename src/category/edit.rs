//! The endpoint for updating categories.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    category::{Category, CategoryForm, CategoryId, NewCategory, update_category},
    extract::{Json, Path},
    timezone::local_today,
};

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct EditCategoryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Replace a category's fields.
///
/// Users can edit their own categories and the categories shared by every user.
pub async fn update_category_endpoint(
    State(state): State<EditCategoryState>,
    auth: AuthContext,
    Path(category_id): Path<CategoryId>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>, Error> {
    let new_category = NewCategory::try_from(form)?;
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_category(category_id, auth.user_id, &new_category, today, &connection)
        .inspect_err(|error| {
            if !matches!(error, Error::UpdateMissingCategory) {
                tracing::error!(
                    "An unexpected error occurred while updating category {category_id}: {error}"
                );
            }
        })
        .map(Json)
}

#[cfg(test)]
mod update_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use time::macros::date;

    use crate::{
        Error,
        auth::AuthContext,
        category::{
            CategoryForm, CategoryName, CategoryType, NewCategory, RegistrationDay,
            create_category,
        },
        extract::{Json, Path},
        test_utils::{create_test_user, create_user_with_email, get_test_connection},
    };

    use super::{EditCategoryState, update_category_endpoint};

    fn form(name: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_owned(),
            category_type: CategoryType::Expense,
            description: None,
            registration_date: Some(15),
            amount: Some(650.0),
        }
    }

    #[tokio::test]
    async fn updates_category() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let category = create_category(
            Some(user.id),
            &NewCategory::new(CategoryName::new_unchecked("Rent"), CategoryType::Expense)
                .recurring(RegistrationDay::new(15).unwrap(), 500.0)
                .unwrap(),
            date!(2024 - 03 - 10),
            &connection,
        )
        .unwrap();
        let state = EditCategoryState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let Json(updated) = update_category_endpoint(
            State(state),
            AuthContext { user_id: user.id },
            Path(category.id),
            Json(form("Flat")),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, CategoryName::new_unchecked("Flat"));
        assert_eq!(updated.amount, Some(650.0));
        assert_eq!(updated.registration_next_date, category.registration_next_date);
    }

    #[tokio::test]
    async fn cannot_update_other_users_category() {
        let connection = get_test_connection();
        let owner = create_test_user(&connection);
        let other_user = create_user_with_email("other@example.com", &connection);
        let category = create_category(
            Some(owner.id),
            &NewCategory::new(CategoryName::new_unchecked("Rent"), CategoryType::Expense),
            date!(2024 - 03 - 10),
            &connection,
        )
        .unwrap();
        let state = EditCategoryState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result = update_category_endpoint(
            State(state),
            AuthContext {
                user_id: other_user.id,
            },
            Path(category.id),
            Json(form("Mine now")),
        )
        .await;

        assert_eq!(result.map(|_| ()), Err(Error::UpdateMissingCategory));
    }
}
