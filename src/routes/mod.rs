//! HTTP routes for tokengate

pub mod auth_routes;
pub mod health;
pub mod me;
pub mod response;

pub use auth_routes::{handle_auth_request, BoxError};
pub use health::{health_check, version_info};
pub use me::handle_me;
pub use response::{
    cors_preflight, empty_body, error_response, full_body, json_response, BoxBody, ErrorResponse,
};
