//! GET /me - identity of the authenticated caller

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::auth::{Role, SecurityContext};
use crate::routes::{json_response, BoxBody, ErrorResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub identity: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Token expiry, milliseconds since the Unix epoch
    pub expires_at: i64,
}

pub fn handle_me(ctx: &SecurityContext) -> Response<BoxBody> {
    let Some(authentication) = ctx.authentication() else {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse::new("Authentication required", Some("UNAUTHENTICATED")),
        );
    };

    let principal = authentication.principal();
    json_response(
        StatusCode::OK,
        &MeResponse {
            identity: principal.identity.clone(),
            first_name: principal.first_name.clone(),
            last_name: principal.last_name.clone(),
            role: principal.role,
            expires_at: authentication.claims().expires_at().timestamp_millis(),
        },
    )
}
