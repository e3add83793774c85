//! The endpoint serving the monthly financial summary.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    summary::engine::compute_summary,
    transaction::{TransactionFilter, TransactionType, db::get_transactions, month_range},
    user::UserID,
};

/// How many transactions the summary lists as recent.
const RECENT_TRANSACTION_COUNT: u32 = 10;

/// The state needed for serving the summary.
#[derive(Debug, Clone)]
pub struct SummaryEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted by the summary endpoint.
///
/// Month and year each default to the current UTC month and year when
/// absent.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    /// The month (1-12) to summarize.
    pub month: Option<u8>,
    /// The year to summarize.
    pub year: Option<i32>,
}

/// Compute the logged-in user's financial summary for a month.
///
/// The total balance and recent transactions cover the user's entire
/// history, while the income, expense and category breakdown figures are
/// limited to the requested month.
///
/// # Errors
///
/// Returns an [Error::InvalidMonth] if the month parameter is not between 1
/// and 12.
pub async fn get_summary_endpoint(
    State(state): State<SummaryEndpointState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<SummaryParams>,
) -> Result<Response, Error> {
    let today = OffsetDateTime::now_utc().date();
    let month = params.month.unwrap_or(today.month() as u8);
    let year = params.year.unwrap_or(today.year());
    let date_range = month_range(year, month)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let all_transactions = get_transactions(user_id, TransactionFilter::default(), &connection)?;
    let monthly_transactions = get_transactions(
        user_id,
        TransactionFilter {
            date_range: Some(date_range.clone()),
            ..Default::default()
        },
        &connection,
    )?;
    let monthly_expense_transactions = get_transactions(
        user_id,
        TransactionFilter {
            date_range: Some(date_range),
            transaction_type: Some(TransactionType::Expense),
            ..Default::default()
        },
        &connection,
    )?;
    let recent_transactions = get_transactions(
        user_id,
        TransactionFilter {
            limit: Some(RECENT_TRANSACTION_COUNT),
            ..Default::default()
        },
        &connection,
    )?;

    let summary = compute_summary(
        &all_transactions,
        &monthly_transactions,
        &monthly_expense_transactions,
        recent_transactions,
    );

    Ok(Json(summary).into_response())
}
