//! The endpoint for deleting a category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, DatabaseID, Error, category::db::delete_category, user::UserID};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a category owned by the logged-in user.
///
/// Transactions that referenced the category are kept and become
/// uncategorized.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingCategory] if the category does not exist or
/// belongs to another user.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, user_id, &connection)?;

    Ok(Json(json!({ "success": true })).into_response())
}
