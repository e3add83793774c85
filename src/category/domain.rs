//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DatabaseID, Error, transaction::TransactionType, user::UserID};

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// Leading and trailing whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is an empty string.
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

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
///
/// A category belongs to a single user and only applies to one side of the
/// ledger, income or expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The category's ID in the application database.
    pub id: DatabaseID,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The category's display name.
    pub name: CategoryName,
    /// Whether the category applies to income or expense transactions.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// An optional icon identifier chosen by the client.
    pub icon: Option<String>,
    /// An optional display color as a hex string, e.g. "#64748b".
    pub color: Option<String>,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The category's display name.
    pub name: String,
    /// Whether the category applies to income or expense transactions.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// An optional icon identifier chosen by the client.
    pub icon: Option<String>,
    /// An optional display color as a hex string.
    pub color: Option<String>,
}

/// The data for editing a category. Fields that are absent are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryForm {
    /// The category's new display name.
    pub name: Option<String>,
    /// The category's new type.
    #[serde(rename = "type")]
    pub category_type: Option<TransactionType>,
    /// The category's new icon. An explicit null clears the icon.
    #[serde(default, with = "serde_with_double_option")]
    pub icon: Option<Option<String>>,
    /// The category's new color. An explicit null clears the color.
    #[serde(default, with = "serde_with_double_option")]
    pub color: Option<Option<String>>,
}

pub(crate) mod serde_with_double_option {
    //! Deserializes a JSON field into `Option<Option<T>>` so that a handler
    //! can tell an absent field (`None`) apart from an explicit null
    //! (`Some(None)`).
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
