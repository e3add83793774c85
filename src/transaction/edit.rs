//! The endpoint for editing a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, DatabaseID, Error,
    transaction::{
        UpdateTransactionForm,
        db::{get_transaction, update_transaction, verify_category},
        domain::{validate_amount, validate_date, validate_description},
    },
    user::UserID,
};

/// The state needed for editing a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Edit a transaction owned by the logged-in user.
///
/// Fields that are absent from the request body are left unchanged. For the
/// category, an explicit null makes the transaction uncategorized.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if the transaction does not exist or belongs to
///   another user.
/// - The same validation errors as creating a transaction for the fields
///   that are present.
pub async fn put_transaction_endpoint(
    State(state): State<EditTransactionEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
    Json(form): Json<UpdateTransactionForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let mut transaction = get_transaction(transaction_id, user_id, &connection)?;

    if let Some(amount) = form.amount {
        transaction.amount = validate_amount(amount)?;
    }

    if let Some(transaction_type) = form.transaction_type {
        transaction.transaction_type = transaction_type;
    }

    if let Some(description) = form.description {
        validate_description(&description)?;
        transaction.description = description;
    }

    if let Some(category_id) = form.category_id {
        verify_category(category_id, user_id, &connection)?;
        transaction.category_id = category_id;
    }

    if let Some(date) = form.date {
        validate_date(date)?;
        transaction.date = date;
    }

    transaction.updated_at = Some(OffsetDateTime::now_utc());
    update_transaction(&transaction, &connection)?;

    // Re-fetch so the resolved category matches the stored row.
    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "transaction": transaction })).into_response())
}
