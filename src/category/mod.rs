//! Categories for grouping transactions, e.g. 'Groceries', 'Rent', 'Salary'.
//!
//! Categories are owned by a user and referenced by transactions and rules.
//! This module contains the core domain types and the database functions for
//! storing and querying categories.

mod db;
mod domain;

pub use db::{
    create_category, create_category_table, get_categories, get_category, get_category_by_name,
    get_fallback_category,
};
pub use domain::{Category, CategoryId, CategoryName, CategoryRole};

pub(crate) use db::check_category_ownership;
