//! Middleware components for request processing.
//!
//! This module contains middleware for logging, request ID tracking,
//! error normalization, rate limiting and authentication.

mod auth;
mod error_handler;
mod logging;
mod rate_limit;
mod request_id;

pub use auth::{CurrentUser, auth_middleware, bearer_token};
pub use error_handler::{RejectedRequest, error_to_status_code, normalize_error_body};
pub use logging::logging_middleware;
pub use rate_limit::{RateLimiter, client_ip, policy, rate_limit_middleware};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
