//! Core transaction domain types and validation rules.

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime, util::days_in_year_month};

use crate::{DatabaseID, Error, category::Category, user::UserID};

/// Whether a transaction adds to or subtracts from the user's balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in, e.g. a salary payment.
    Income,
    /// Money going out, e.g. a grocery shop.
    Expense,
}

impl TransactionType {
    /// The type as the lowercase string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::InvalidTransactionType(other.to_string())),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The largest amount a transaction may have, matching a DECIMAL(12, 2) column.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Check that `amount` is positive and within the currency ceiling, and round
/// it to two decimal places.
///
/// # Errors
///
/// Returns an [Error::AmountOutOfRange] if `amount` is zero, negative, or
/// greater than [MAX_AMOUNT].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount <= Decimal::ZERO || amount > MAX_AMOUNT {
        return Err(Error::AmountOutOfRange);
    }

    Ok(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Check that `description` fits in the transaction table.
///
/// # Errors
///
/// Returns an [Error::DescriptionTooLong] if `description` is longer than 255
/// characters.
pub fn validate_description(description: &str) -> Result<(), Error> {
    if description.chars().count() > 255 {
        return Err(Error::DescriptionTooLong);
    }

    Ok(())
}

/// Check that `date` is not in the future and not more than 100 years in the
/// past.
///
/// Transactions record events that have already happened, so future dates are
/// rejected, and dates older than a century are assumed to be typos.
pub fn validate_date(date: Date) -> Result<(), Error> {
    let today = OffsetDateTime::now_utc().date();

    if date > today {
        return Err(Error::FutureDate(date));
    }

    // The 29th of February may not exist 100 years ago, fall back to the 28th.
    let min_date = today
        .replace_year(today.year() - 100)
        .or_else(|_| today.replace_day(28).and_then(|d| d.replace_year(today.year() - 100)))
        .map_err(|_| Error::DateTooOld(date))?;

    if date < min_date {
        return Err(Error::DateTooOld(date));
    }

    Ok(())
}

/// The dates spanned by `month` of `year`, for filtering transactions.
///
/// # Errors
///
/// Returns an [Error::InvalidMonth] if `month` is not between 1 and 12.
pub fn month_range(year: i32, month: u8) -> Result<RangeInclusive<Date>, Error> {
    let month = Month::try_from(month).map_err(|_| Error::InvalidMonth(month))?;

    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|_| Error::InvalidMonth(month as u8))?;
    let end = Date::from_calendar_date(year, month, days_in_year_month(year, month))
        .map_err(|_| Error::InvalidMonth(month as u8))?;

    Ok(start..=end)
}

/// The dates spanned by `year`, for filtering transactions.
pub fn year_range(year: i32) -> Result<RangeInclusive<Date>, Error> {
    let start = month_range(year, 1)?;
    let end = month_range(year, 12)?;

    Ok(*start.start()..=*end.end())
}

pub(crate) mod date_format {
    //! Serializes a [time::Date] as a "[year]-[month]-[day]" string, the same
    //! format the dates are stored with in the database.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }

    /// Like [deserialize], but produces `Some(date)` for use with optional
    /// form fields.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize(deserializer).map(Some)
    }
}

/// An income or expense recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The transaction's ID in the application database.
    pub id: DatabaseID,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money, always positive and with at most two decimal places.
    pub amount: Decimal,
    /// A short description of the transaction.
    pub description: String,
    /// The ID of the category the transaction is filed under, if any.
    pub category_id: Option<DatabaseID>,
    /// The day the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last edited, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// The category the transaction is filed under, resolved for the client.
    pub category: Option<Category>,
}

/// The data for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The amount of money.
    pub amount: Decimal,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A short description of the transaction.
    pub description: String,
    /// The ID of one of the user's categories, if the transaction has one.
    pub category_id: Option<DatabaseID>,
    /// The day the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
}

/// The data for editing a transaction. Fields that are absent are left
/// unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionForm {
    /// The transaction's new amount.
    pub amount: Option<Decimal>,
    /// The transaction's new type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The transaction's new description.
    pub description: Option<String>,
    /// The transaction's new category. An explicit null makes the transaction
    /// uncategorized.
    #[serde(default, with = "crate::category::serde_with_double_option")]
    pub category_id: Option<Option<DatabaseID>>,
    /// The transaction's new date.
    #[serde(default, deserialize_with = "date_format::deserialize_option")]
    pub date: Option<Date>,
}
