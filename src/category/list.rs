//! The endpoint for listing a user's categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, Error, category::db::get_all_categories, user::UserID};

/// The state needed for listing categories.
#[derive(Debug, Clone)]
pub struct ListCategoriesEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListCategoriesEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List all of the logged-in user's categories, ordered by type and then name.
pub async fn get_categories_endpoint(
    State(state): State<ListCategoriesEndpointState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(user_id, &connection)?;

    Ok(Json(json!({ "categories": categories })).into_response())
}
