//! Maps the API endpoints to their handlers.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    auth::{post_log_in, post_log_out, register_user},
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, permanently_delete_category_endpoint, update_category_endpoint,
    },
    endpoints,
    not_found::get_404_not_found,
    recurring::trigger_recurring_transactions,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_summary_endpoint,
        get_transaction_endpoint, list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Every route except registration, log-in and log-out needs the auth
/// cookie. The recurring transaction trigger instead needs the cron secret
/// as a bearer token.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::PERMANENT_DELETE_CATEGORY,
            delete(permanently_delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::RECURRING_CRON,
            get(trigger_recurring_transactions).post(trigger_recurring_transactions),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}
