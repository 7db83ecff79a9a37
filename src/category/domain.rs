//! Core category domain types.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, UserID};

/// Database identifier for a category.
pub type CategoryId = i64;

/// Whether money in a category is earned or spent.
///
/// Transactions store their own copy of this so that they keep their meaning
/// if the category changes later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Money earned, e.g. salary.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl CategoryType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for CategoryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CategoryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The day of the month on which a recurring category fires, from 1 to 31.
///
/// Months shorter than the day fire on their last day instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RegistrationDay(u8);

impl RegistrationDay {
    /// Create a registration day.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRegistrationDay] if `day` is not in 1..=31.
    pub fn new(day: u8) -> Result<Self, Error> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(Error::InvalidRegistrationDay(day))
        }
    }

    /// The day of the month.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for RegistrationDay {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        RegistrationDay::new(value)
    }
}

impl From<RegistrationDay> for u8 {
    fn from(value: RegistrationDay) -> Self {
        value.0
    }
}

impl ToSql for RegistrationDay {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.0)))
    }
}

impl FromSql for RegistrationDay {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let day = u8::column_result(value)?;

        RegistrationDay::new(day).map_err(|_| FromSqlError::OutOfRange(day.into()))
    }
}

/// A bucket that transactions are sorted into.
///
/// A category is recurring when `registration_next_date` is set. Each day the
/// recurring job creates a transaction of `amount` for the categories due
/// that day, then moves `registration_next_date` on by a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The owner, or `None` for categories shared by every user.
    pub user_id: Option<UserID>,
    /// The display name.
    pub name: CategoryName,
    /// Whether the category tracks income or expenses.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Free text notes.
    pub description: String,
    /// Archived categories are hidden and never fire.
    pub is_deleted: bool,
    /// The day of the month a recurring category fires on.
    pub registration_date: Option<RegistrationDay>,
    /// The next date a recurring category fires on.
    pub registration_next_date: Option<Date>,
    /// The amount a recurring category posts.
    pub amount: Option<f64>,
}

/// The request body for creating or updating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The display name.
    pub name: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Free text notes.
    #[serde(default)]
    pub description: Option<String>,
    /// The day of the month to fire on. Leave empty for a one-off category.
    #[serde(default)]
    pub registration_date: Option<u8>,
    /// The amount to post on each firing.
    #[serde(default)]
    pub amount: Option<f64>,
}

/// The validated fields of a category that is about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The display name.
    pub name: CategoryName,
    /// Income or expense.
    pub category_type: CategoryType,
    /// Free text notes.
    pub description: String,
    /// The day of the month to fire on, if recurring.
    pub registration_date: Option<RegistrationDay>,
    /// The amount to post on each firing.
    pub amount: Option<f64>,
}

impl NewCategory {
    /// A category that never fires.
    pub fn new(name: CategoryName, category_type: CategoryType) -> Self {
        Self {
            name,
            category_type,
            description: String::new(),
            registration_date: None,
            amount: None,
        }
    }

    /// Make the category fire on `day` each month, posting `amount`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `amount` is not a finite number above zero.
    pub fn recurring(mut self, day: RegistrationDay, amount: f64) -> Result<Self, Error> {
        self.registration_date = Some(day);
        self.amount = Some(validate_amount(amount)?);
        Ok(self)
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

impl TryFrom<CategoryForm> for NewCategory {
    type Error = Error;

    fn try_from(form: CategoryForm) -> Result<Self, Self::Error> {
        let name = CategoryName::new(&form.name)?;
        let amount = form.amount.map(validate_amount).transpose()?;
        let registration_date = form
            .registration_date
            .map(RegistrationDay::new)
            .transpose()?;

        if registration_date.is_some() && amount.is_none() {
            return Err(Error::MissingRecurringAmount);
        }

        Ok(Self {
            name,
            category_type: form.category_type,
            description: form.description.unwrap_or_default().trim().to_owned(),
            registration_date,
            amount,
        })
    }
}

/// Check that `amount` is a finite number greater than zero.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] otherwise.
pub(crate) fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidAmount(amount))
    }
}



#[cfg(test)]
mod category_form_tests {
    use crate::{
        Error,
        category::{CategoryForm, CategoryType, NewCategory, RegistrationDay},
    };

    fn form(registration_date: Option<u8>, amount: Option<f64>) -> CategoryForm {
        CategoryForm {
            name: "Rent".to_owned(),
            category_type: CategoryType::Expense,
            description: None,
            registration_date,
            amount,
        }
    }

    #[test]
    fn recurring_form_is_valid() {
        let category = NewCategory::try_from(form(Some(15), Some(500.0))).unwrap();

        assert_eq!(category.registration_date, Some(RegistrationDay::new(15).unwrap()));
        assert_eq!(category.amount, Some(500.0));
    }

    #[test]
    fn recurring_form_requires_amount() {
        let result = NewCategory::try_from(form(Some(15), None));

        assert_eq!(result, Err(Error::MissingRecurringAmount));
    }

    #[test]
    fn rejects_out_of_range_day() {
        let result = NewCategory::try_from(form(Some(0), Some(10.0)));

        assert_eq!(result, Err(Error::InvalidRegistrationDay(0)));
    }

    #[test]
    fn rejects_negative_amount() {
        let result = NewCategory::try_from(form(None, Some(-5.0)));

        assert_eq!(result, Err(Error::InvalidAmount(-5.0)));
    }

    #[test]
    fn deserializes_type_field() {
        let form: CategoryForm =
            serde_json::from_str(r#"{"name": "Salary", "type": "income"}"#).unwrap();

        assert_eq!(form.category_type, CategoryType::Income);
        assert_eq!(form.registration_date, None);
    }
}
