//! The endpoint for creating a category.

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
    category::{CategoryForm, CategoryName, db::create_category},
    user::UserID,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a category for the logged-in user.
///
/// # Errors
///
/// Returns an [Error::EmptyCategoryName] if the name is empty or whitespace.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<CategoryForm>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(
        name,
        form.category_type,
        form.icon,
        form.color,
        user_id,
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(json!({ "category": category }))).into_response())
}
