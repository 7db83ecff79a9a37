//! Income and expense transactions, and the monthly totals built from them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod summary;
mod window;

pub use self::core::{
    NewTransaction, Transaction, TransactionForm, TransactionId, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, get_transactions_in_window,
    update_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::update_transaction_endpoint;
pub use list_endpoint::{get_transaction_endpoint, list_transactions_endpoint};
pub use summary::{MonthlyCategoryTotal, get_monthly_summary, get_summary_endpoint};
pub use window::{DateWindow, WindowQuery};
