//! Month and year date windows for listing and summarising transactions.

use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::Error;

/// The `month` and `year` query parameters.
///
/// `month` takes precedence when both are given.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// A month as "YYYY-MM", or any date in the month as "YYYY-MM-DD".
    pub month: Option<String>,
    /// A year as "YYYY".
    pub year: Option<String>,
}

impl WindowQuery {
    /// The requested window, or `default` when no window was requested.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidWindow] if the requested window cannot be parsed.
    pub fn window_or(&self, default: DateWindow) -> Result<DateWindow, Error> {
        match (self.month.as_deref(), self.year.as_deref()) {
            (Some(month), _) => DateWindow::parse(month),
            (None, Some(year)) => DateWindow::parse(year),
            (None, None) => Ok(default),
        }
    }
}

/// A half-open range of dates, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    /// The first date in the window.
    pub start: Date,
    /// The first date after the window.
    pub end: Date,
}

impl DateWindow {
    /// The calendar month `month` of `year`.
    ///
    /// # Errors
    ///
    /// Returns [Error::DateOutOfRange] if the month after is not representable.
    pub fn month(year: i32, month: Month) -> Result<Self, Error> {
        let start = first_of_month(year, month)?;
        let end = match month {
            Month::December => first_of_month(year + 1, Month::January)?,
            month => first_of_month(year, month.next())?,
        };

        Ok(Self { start, end })
    }

    /// The calendar month containing `date`.
    ///
    /// # Errors
    ///
    /// Returns [Error::DateOutOfRange] if the month after is not representable.
    pub fn month_of(date: Date) -> Result<Self, Error> {
        Self::month(date.year(), date.month())
    }

    /// January 1 of `year` up to January 1 of the year after.
    ///
    /// # Errors
    ///
    /// Returns [Error::DateOutOfRange] if the year after is not representable.
    pub fn year(year: i32) -> Result<Self, Error> {
        Ok(Self {
            start: first_of_month(year, Month::January)?,
            end: first_of_month(year + 1, Month::January)?,
        })
    }

    /// Parse "YYYY" as a year window, and "YYYY-MM" or "YYYY-MM-DD" as a month window.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidWindow] if `raw` is not in one of those forms or
    /// is not a real date.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidWindow(raw.to_owned());
        let parts: Vec<&str> = raw.trim().split('-').collect();

        match parts.as_slice() {
            [year] => Self::year(parse_digits(year, 4).ok_or_else(invalid)?),
            [year, month] => {
                let year = parse_digits(year, 4).ok_or_else(invalid)?;
                let month = parse_digits::<u8>(month, 2)
                    .and_then(|month| Month::try_from(month).ok())
                    .ok_or_else(invalid)?;

                Self::month(year, month)
            }
            [year, month, day] => {
                let year = parse_digits(year, 4).ok_or_else(invalid)?;
                let month = parse_digits::<u8>(month, 2)
                    .and_then(|month| Month::try_from(month).ok())
                    .ok_or_else(invalid)?;
                let day = parse_digits(day, 2).ok_or_else(invalid)?;
                let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;

                Self::month_of(date)
            }
            _ => Err(invalid()),
        }
    }
}

fn first_of_month(year: i32, month: Month) -> Result<Date, Error> {
    Date::from_calendar_date(year, month, 1).map_err(|_| Error::DateOutOfRange)
}

fn parse_digits<T: std::str::FromStr>(raw: &str, digits: usize) -> Option<T> {
    if raw.len() == digits && raw.bytes().all(|byte| byte.is_ascii_digit()) {
        raw.parse().ok()
    } else {
        None
    }
}
