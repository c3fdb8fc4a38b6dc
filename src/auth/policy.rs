//! Route access policy
//!
//! Runs after the authentication gate. Public path prefixes pass untouched;
//! everything else needs an authenticated security context.

use async_trait::async_trait;
use hyper::http::request::Parts;
use hyper::StatusCode;
use tracing::info;

use crate::auth::SecurityContext;
use crate::routes::{json_response, ErrorResponse};
use crate::server::{Decision, Interceptor};

/// Paths reachable without a token
pub const DEFAULT_PUBLIC_PREFIXES: [&str; 3] = ["/auth/", "/health", "/version"];

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_prefixes: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES)
    }
}

impl AccessPolicy {
    pub fn new<I, S>(public_prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public_prefixes: public_prefixes
                .into_iter()
                .map(|p| p.into().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    /// `/auth/` covers `/auth` and everything below it, not `/authority`
    pub fn is_public(&self, path: &str) -> bool {
        self.public_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[async_trait]
impl Interceptor for AccessPolicy {
    fn name(&self) -> &'static str {
        "access-policy"
    }

    async fn intercept(&self, request: &Parts, ctx: &mut SecurityContext) -> Decision {
        let path = request.uri.path();
        if self.is_public(path) || ctx.is_authenticated() {
            return Decision::Continue;
        }

        info!("Rejected unauthenticated {} {}", request.method, path);
        Decision::Respond(json_response(
            StatusCode::UNAUTHORIZED,
            &ErrorResponse::new("Authentication required", Some("UNAUTHENTICATED")),
        ))
    }
}
