//! The route for registering a new user.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::cookie::set_auth_cookie,
    password::{PasswordHash, ValidatedPassword},
    user::{User, UserID, create_user},
};

/// The data for a user registration request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The email address to register the user with.
    pub email: String,
    /// The user's plain text password.
    pub password: String,
    /// A repeat of the password, to catch typos.
    pub confirm_password: String,
}

/// The public view of a user that is safe to send to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: String,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            created_at: user.created_at,
        }
    }
}

/// Register a new user and log them in.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidEmail] if the email cannot be parsed.
/// - [Error::PasswordMismatch] if the two passwords do not match.
/// - [Error::TooWeak] if the password is too weak.
/// - [Error::DuplicateEmail] if the email is already registered.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_register_user(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(form): Json<RegisterForm>,
) -> Result<Response, Error> {
    let email: EmailAddress = form
        .email
        .trim()
        .parse()
        .map_err(|_| Error::InvalidEmail(form.email.clone()))?;

    if form.password != form.confirm_password {
        return Err(Error::PasswordMismatch);
    }

    let validated_password = ValidatedPassword::new(&form.password)?;
    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        create_user(email, password_hash, &connection)?
    };

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((StatusCode::CREATED, jar, Json(UserResponse::from(&user))).into_response())
}
