//! The endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, DatabaseID, Error, transaction::db::delete_transaction, user::UserID};

/// The state needed for deleting a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a transaction owned by the logged-in user.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingTransaction] if the transaction does not
/// exist or belongs to another user.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "success": true })).into_response())
}
