//! Turns recurring categories into transactions on the day they are due.
//!
//! An external scheduler calls the trigger endpoint once a day. Every
//! category whose next date is today gets one transaction, and its next date
//! moves on by one month. Each category is handled in its own database
//! transaction, so one failure leaves the others untouched and a failed
//! category stays due for the next attempt.

mod materialize;
mod schedule;
mod trigger;

pub use materialize::{
    CategoryFailure, CreatedTransaction, DEFAULT_RECURRING_CONCURRENCY, FireOutcome, JobStatus,
    MaterializeReport, RECURRING_MEMO, fire_recurring_category, get_due_category_ids,
    materialize_recurring_categories,
};
pub use schedule::{add_one_month, next_registration_date};
pub use trigger::{CronSecret, trigger_recurring_transactions};
