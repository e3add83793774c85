//! The endpoint for editing a category.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, DatabaseID, Error,
    category::{
        CategoryName, UpdateCategoryForm,
        db::{get_category, update_category},
    },
    user::UserID,
};

/// The state needed for editing a category.
#[derive(Debug, Clone)]
pub struct EditCategoryEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Edit a category owned by the logged-in user.
///
/// Fields that are absent from the request body are left unchanged. For the
/// icon and color, an explicit null clears the stored value.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if the category does not exist or belongs to another user.
/// - [Error::EmptyCategoryName] if the new name is empty or whitespace.
pub async fn put_category_endpoint(
    State(state): State<EditCategoryEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseID>,
    Json(form): Json<UpdateCategoryForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let mut category = get_category(category_id, user_id, &connection)?;

    if let Some(name) = form.name {
        category.name = CategoryName::new(&name)?;
    }

    if let Some(category_type) = form.category_type {
        category.category_type = category_type;
    }

    if let Some(icon) = form.icon {
        category.icon = icon;
    }

    if let Some(color) = form.color {
        category.color = color;
    }

    update_category(&category, &connection)?;

    Ok(Json(json!({ "category": category })).into_response())
}
