//! User accounts, passwords and the cookie that identifies a logged in user.

mod context;
mod cookie;
mod log_in;
mod log_out;
mod password;
mod register;
mod token;
mod user;

pub use context::AuthContext;
pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::post_log_in;
pub use log_out::post_log_out;
pub use password::{PasswordHash, ValidatedPassword};
pub use register::register_user;
pub(crate) use token::Token;
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
