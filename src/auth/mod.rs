//! User authentication: the auth cookie, the middleware guarding protected
//! routes, and the registration, log-in and log-out endpoints.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod register;
mod token;

pub use cookie::{
    COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use log_in::post_log_in;
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use register::{UserResponse, post_register_user};
