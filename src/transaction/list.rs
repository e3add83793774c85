//! The endpoints for listing transactions and fetching a single transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, DatabaseID, Error,
    transaction::{
        TransactionType,
        db::{TransactionFilter, get_transaction, get_transactions},
        domain::{month_range, year_range},
    },
    user::UserID,
};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsEndpointState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters accepted when listing transactions.
///
/// A month on its own is ignored, it only takes effect together with a year.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    /// Only include transactions in this month (1-12) of `year`.
    pub month: Option<u8>,
    /// Only include transactions in this year.
    pub year: Option<i32>,
    /// Only include transactions of this type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Only include transactions filed under this category.
    pub category_id: Option<DatabaseID>,
}

impl TransactionListParams {
    fn into_filter(self) -> Result<TransactionFilter, Error> {
        let date_range = match (self.month, self.year) {
            (Some(month), Some(year)) => Some(month_range(year, month)?),
            (None, Some(year)) => Some(year_range(year)?),
            _ => None,
        };

        Ok(TransactionFilter {
            date_range,
            transaction_type: self.transaction_type,
            category_id: self.category_id,
            limit: None,
        })
    }
}

/// List the logged-in user's transactions, newest first.
///
/// # Errors
///
/// Returns an [Error::InvalidMonth] if the month parameter is not between 1
/// and 12.
pub async fn get_transactions_endpoint(
    State(state): State<ListTransactionsEndpointState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<TransactionListParams>,
) -> Result<Response, Error> {
    let filter = params.into_filter()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(user_id, filter, &connection)?;

    Ok(Json(json!({ "transactions": transactions })).into_response())
}

/// Fetch a single transaction owned by the logged-in user.
///
/// # Errors
///
/// Returns an [Error::NotFound] if the transaction does not exist or belongs
/// to another user.
pub async fn get_transaction_endpoint(
    State(state): State<ListTransactionsEndpointState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "transaction": transaction })).into_response())
}

#[cfg(test)]
mod list_transactions_endpoint_tests {
    use axum::{Extension, Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        AppState,
        endpoints::{self, format_endpoint},
        password::PasswordHash,
        transaction::{
            TransactionType,
            db::{NewTransaction, create_transaction},
        },
        user::create_user,
    };

    use super::{get_transaction_endpoint, get_transactions_endpoint};

    fn get_test_server() -> (TestServer, i64) {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "averysecretsecret").unwrap();

        let (user_id, transaction_id) = {
            let connection = state.db_connection.lock().unwrap();
            let user = create_user(
                "test@test.com".parse().unwrap(),
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap();

            let salary = create_transaction(
                NewTransaction {
                    user_id: user.id,
                    transaction_type: TransactionType::Income,
                    amount: "1000".parse().unwrap(),
                    description: "Salary".to_string(),
                    category_id: None,
                    date: date!(2025 - 01 - 05),
                },
                &connection,
            )
            .unwrap();

            create_transaction(
                NewTransaction {
                    user_id: user.id,
                    transaction_type: TransactionType::Expense,
                    amount: "200".parse().unwrap(),
                    description: "Groceries".to_string(),
                    category_id: None,
                    date: date!(2025 - 02 - 10),
                },
                &connection,
            )
            .unwrap();

            (user.id, salary.id)
        };

        let app = Router::new()
            .route(endpoints::TRANSACTIONS, get(get_transactions_endpoint))
            .route(endpoints::TRANSACTION, get(get_transaction_endpoint))
            .layer(Extension(user_id))
            .with_state(state);

        let server = TestServer::new(app).expect("Could not create test server.");

        (server, transaction_id)
    }

    #[tokio::test]
    async fn list_transactions_returns_newest_first() {
        let (server, _) = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS).await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0]["description"], "Groceries");
        assert_eq!(transactions[1]["description"], "Salary");
    }

    #[tokio::test]
    async fn list_transactions_filters_by_month_and_year() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", 1)
            .add_query_param("year", 2025)
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["description"], "Salary");
    }

    #[tokio::test]
    async fn list_transactions_rejects_invalid_month() {
        let (server, _) = get_test_server();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", 13)
            .add_query_param("year", 2025)
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn get_single_transaction_succeeds() {
        let (server, transaction_id) = get_test_server();

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction_id))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["transaction"]["description"], "Salary");
    }

    #[tokio::test]
    async fn get_missing_transaction_returns_not_found() {
        let (server, transaction_id) = get_test_server();

        let response = server
            .get(&format_endpoint(
                endpoints::TRANSACTION,
                transaction_id + 123,
            ))
            .await;

        response.assert_status_not_found();
    }
}
