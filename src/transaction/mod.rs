//! Income and expense transactions: domain types, validation, database
//! operations and the CRUD endpoints.

mod create;
pub(crate) mod db;
mod delete;
pub(crate) mod domain;
mod edit;
mod list;

pub use create::create_transaction_endpoint;
pub use db::{NewTransaction, TransactionFilter, create_transaction_table};
pub use delete::delete_transaction_endpoint;
pub use domain::{
    MAX_AMOUNT, Transaction, TransactionForm, TransactionType, UpdateTransactionForm, month_range,
    validate_amount, validate_date, validate_description, year_range,
};
pub use edit::put_transaction_endpoint;
pub use list::{get_transaction_endpoint, get_transactions_endpoint};
