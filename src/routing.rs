//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, get_log_out, post_log_in, post_register_user},
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        put_category_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    rate_limit::rate_limit_guard,
    summary::get_summary_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        get_transactions_endpoint, put_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    // Registration and log-in are rate limited since they are the only
    // routes an unauthenticated client can usefully hammer.
    let rate_limited_routes = Router::new()
        .route(endpoints::USERS, post(post_register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_guard,
        ));

    // Logging out only clears the cookie, so it does not need the auth
    // guard. Putting it behind the guard would also re-issue a fresh cookie
    // after the handler cleared it.
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .merge(rate_limited_routes);

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(put_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(put_category_endpoint).delete(delete_category_endpoint),
        )
        .route(endpoints::SUMMARY, get(get_summary_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "error": "I'm a teapot" })),
    )
        .into_response()
}

/// The JSON response for requests that match no route.
async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
        .into_response()
}
