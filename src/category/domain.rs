//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, user::UserID};

/// Database identifier for a category.
pub type CategoryId = i64;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
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

/// A stable role tag that marks a category as special to the engine.
///
/// Roles decouple engine behaviour from display names: renaming the "Other"
/// category does not break the bulk-import fallback as long as the role is
/// set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum CategoryRole {
    /// The bucket that bulk-imported transactions land in when no keyword
    /// group matches their description.
    UncategorisedFallback,
}

impl CategoryRole {
    /// The string stored in the database for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryRole::UncategorisedFallback => "uncategorised-fallback",
        }
    }

    /// Parse a role from its database column value.
    ///
    /// Unknown role strings are treated as no role rather than an error so
    /// that rows written by a newer schema still load.
    pub(crate) fn from_column(value: Option<String>) -> Option<Self> {
        match value.as_deref() {
            Some("uncategorised-fallback") => Some(CategoryRole::UncategorisedFallback),
            _ => None,
        }
    }
}

impl Display for CategoryRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: CategoryName,
    /// The special role this category plays, if any.
    pub role: Option<CategoryRole>,
    /// The user that owns this category.
    pub user_id: UserID,
}
