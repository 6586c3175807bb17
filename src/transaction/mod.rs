//! Transaction management for the categorisation engine.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and categorising transactions
//!
//! Transactions are created by the import/sync side of the application; the
//! engine only ever writes the `category_id` column.

mod core;

pub use core::{
    Direction, Transaction, TransactionBuilder, create_transaction, create_transaction_table,
    get_categorised_transactions, get_transaction, map_transaction_row, set_transaction_category,
};
