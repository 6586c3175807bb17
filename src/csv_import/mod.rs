//! Bulk import of transactions from CSV statement exports.
//!
//! Imported rows get a starting category from a fixed keyword table — no
//! user-defined rules required — so a fresh account is not a wall of
//! uncategorised transactions. The keyword classifier is deliberately
//! independent of the per-user rule store and never feeds the learning
//! promoter.

mod classifier;
mod csv;
mod import_transactions;

pub use classifier::classify_description;
pub use csv::parse_csv;
pub use import_transactions::{ImportResult, import_csv, import_transaction_list};
