//! The route for logging in a registered user.
//! The auth module handles the lower level authentication and cookie auth logic.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{cookie::set_auth_cookie, register::UserResponse},
    user::get_user_by_email,
};

/// The credentials sent by the client when logging in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The email address the user registered with.
    pub email: String,
    /// The user's plain text password.
    pub password: String,
}

/// Verify the user's credentials and set the auth cookie if they are valid.
///
/// # Errors
///
/// Returns an [Error::InvalidCredentials] if the email is not registered or the
/// password is incorrect. The two cases are deliberately indistinguishable to
/// the client.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_log_in(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<Response, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_email(credentials.email.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((jar, Json(UserResponse::from(&user))).into_response())
}
