//! Categories for grouping transactions: domain types, database operations
//! and the CRUD endpoints.

mod create;
pub(crate) mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::create_category_table;
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryForm, CategoryName, UpdateCategoryForm};
pub(crate) use domain::serde_with_double_option;
pub use edit::put_category_endpoint;
pub use list::get_categories_endpoint;
