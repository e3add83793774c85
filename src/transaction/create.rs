//! The endpoint for creating a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    transaction::{
        TransactionForm,
        db::{NewTransaction, create_transaction},
        domain::{validate_amount, validate_date, validate_description},
    },
    user::UserID,
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a transaction for the logged-in user.
///
/// # Errors
///
/// Returns:
/// - [Error::AmountOutOfRange] if the amount is zero, negative, or too large.
/// - [Error::DescriptionTooLong] if the description exceeds 255 characters.
/// - [Error::FutureDate] or [Error::DateTooOld] if the date is out of range.
/// - [Error::InvalidCategory] if the category does not exist or belongs to
///   another user.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionEndpointState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let amount = validate_amount(form.amount)?;
    validate_description(&form.description)?;
    validate_date(form.date)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(
        NewTransaction {
            user_id,
            transaction_type: form.transaction_type,
            amount,
            description: form.description,
            category_id: form.category_id,
            date: form.date,
        },
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "transaction": transaction }))).into_response())
}
