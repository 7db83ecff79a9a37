//! Month arithmetic for recurring categories.
//!
//! A recurring category fires on an anchor day of the month. In months that
//! are too short for the anchor day, it fires on the last day of the month
//! instead, and returns to the anchor day the month after. So a category
//! anchored on the 31st fires on Jan 31, Feb 29 (or 28), Mar 31 and so on.

use time::{Date, Month, util::is_leap_year};

use crate::{Error, category::RegistrationDay};

/// The date one calendar month after `date` on `anchor_day`, clamped to the
/// last day of that month.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the result would be past the last
/// representable date.
pub fn add_one_month(date: Date, anchor_day: RegistrationDay) -> Result<Date, Error> {
    let (year, month) = match date.month() {
        Month::December => (
            date.year().checked_add(1).ok_or(Error::DateOutOfRange)?,
            Month::January,
        ),
        month => (date.year(), month.next()),
    };

    clamped_date(year, month, anchor_day)
}

/// The first date strictly after `today` that falls on `day`, clamped to the
/// last day of the month.
///
/// Used when a category becomes recurring or its day changes. When this
/// month's date is today or has already passed, the category first fires next
/// month.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the result would be past the last
/// representable date.
pub fn next_registration_date(today: Date, day: RegistrationDay) -> Result<Date, Error> {
    let this_month = clamped_date(today.year(), today.month(), day)?;

    if this_month > today {
        Ok(this_month)
    } else {
        add_one_month(this_month, day)
    }
}

fn clamped_date(year: i32, month: Month, day: RegistrationDay) -> Result<Date, Error> {
    let day = day.get().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).map_err(|_| Error::DateOutOfRange)
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}
