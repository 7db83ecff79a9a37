//! The endpoint for creating categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::{HeaderName, StatusCode, header::LOCATION},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    category::{Category, CategoryForm, NewCategory, create_category},
    endpoints,
    extract::Json,
    timezone::local_today,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category owned by the logged in user.
///
/// Recurring categories first fire on the next occurrence of their day after
/// today in the local timezone.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    auth: AuthContext,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Category>), Error> {
    let new_category = NewCategory::try_from(form)?;
    let today = local_today(&state.local_timezone)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(Some(auth.user_id), &new_category, today, &connection)?;

    tracing::info!(
        "User {} created category {} (recurring: {})",
        auth.user_id,
        category.id,
        category.registration_next_date.is_some()
    );

    let location = endpoints::format_endpoint(endpoints::CATEGORY, category.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(category)))
}

#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{StatusCode, header::LOCATION},
    };

    use crate::{
        Error,
        auth::AuthContext,
        category::{CategoryForm, CategoryType, get_category},
        extract::Json,
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{CreateCategoryState, create_category_endpoint};

    fn get_state() -> (CreateCategoryState, AuthContext) {
        let connection = get_test_connection();
        let user = create_test_user(&connection);

        (
            CreateCategoryState {
                local_timezone: "Etc/UTC".to_owned(),
                db_connection: Arc::new(Mutex::new(connection)),
            },
            AuthContext { user_id: user.id },
        )
    }

    fn form(registration_date: Option<u8>, amount: Option<f64>) -> CategoryForm {
        CategoryForm {
            name: "Rent".to_owned(),
            category_type: CategoryType::Expense,
            description: Some("Monthly rent".to_owned()),
            registration_date,
            amount,
        }
    }

    #[tokio::test]
    async fn creates_recurring_category() {
        let (state, auth) = get_state();

        let (status, headers, Json(category)) =
            create_category_endpoint(State(state.clone()), auth, Json(form(Some(1), Some(500.0))))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[0].0, LOCATION);
        assert_eq!(headers[0].1, format!("/api/categories/{}", category.id));
        assert_eq!(category.user_id, Some(auth.user_id));
        assert!(category.registration_next_date.is_some());
        let stored = get_category(
            category.id,
            auth.user_id,
            &state.db_connection.lock().unwrap(),
        );
        assert_eq!(stored, Ok(category));
    }

    #[tokio::test]
    async fn rejects_recurring_category_without_amount() {
        let (state, auth) = get_state();

        let result =
            create_category_endpoint(State(state), auth, Json(form(Some(1), None))).await;

        assert_eq!(result.map(|_| ()), Err(Error::MissingRecurringAmount));
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let (state, auth) = get_state();
        let mut form = form(None, None);
        form.name = "   ".to_owned();

        let result = create_category_endpoint(State(state), auth, Json(form)).await;

        assert_eq!(result.map(|_| ()), Err(Error::EmptyCategoryName));
    }
}
