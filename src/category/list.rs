//! Endpoints for reading categories.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::AuthContext,
    category::{Category, CategoryId, get_categories, get_category},
    extract::{Json, Path},
};

/// The state needed for reading categories.
#[derive(Debug, Clone)]
pub struct CategoryListState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the active categories visible to the logged in user.
pub async fn list_categories_endpoint(
    State(state): State<CategoryListState>,
    auth: AuthContext,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_categories(auth.user_id, &connection).map(Json)
}

/// Get a single active category visible to the logged in user.
pub async fn get_category_endpoint(
    State(state): State<CategoryListState>,
    auth: AuthContext,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_category(category_id, auth.user_id, &connection).map(Json)
}
