//! Income and expense categories, including recurring ones.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_category, create_category_table, delete_category, get_categories, get_category,
    permanently_delete_category, update_category,
};
pub(crate) use db::{CATEGORY_COLUMNS, map_category_row};
pub use delete::{delete_category_endpoint, permanently_delete_category_endpoint};
pub(crate) use domain::validate_amount;
pub use domain::{
    Category, CategoryForm, CategoryId, CategoryName, CategoryType, NewCategory, RegistrationDay,
};
pub use edit::update_category_endpoint;
pub use list::{get_category_endpoint, list_categories_endpoint};
