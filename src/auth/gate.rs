//! Bearer token authentication gate
//!
//! First interceptor of every request. Reads `Authorization: Bearer <token>`,
//! verifies the token, loads the principal and populates the request's
//! `SecurityContext`. It never rejects a request: every failure leaves the
//! context empty and lets the access policy decide.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::header::{HeaderMap, AUTHORIZATION};
use hyper::http::request::Parts;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{extract_token_from_header, Authentication, SecurityContext, TokenCodec};
use crate::db::PrincipalStore;
use crate::server::{Decision, Interceptor};

/// Default bound on the principal lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// What the gate did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    NoHeader,
    NotBearer,
    Unparseable,
    AlreadyAuthenticated,
    PrincipalNotFound,
    LookupFailed,
    LookupTimedOut,
    InvalidToken,
    Authenticated,
}

#[derive(Clone)]
pub struct AuthenticationGate {
    codec: TokenCodec,
    store: Arc<dyn PrincipalStore>,
    lookup_timeout: Duration,
}

impl AuthenticationGate {
    pub fn new(codec: TokenCodec, store: Arc<dyn PrincipalStore>, lookup_timeout: Duration) -> Self {
        Self {
            codec,
            store,
            lookup_timeout,
        }
    }

    /// Authenticate against the current time
    pub async fn authenticate(&self, headers: &HeaderMap, ctx: &mut SecurityContext) -> GateOutcome {
        self.authenticate_at(headers, ctx, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        headers: &HeaderMap,
        ctx: &mut SecurityContext,
        now: DateTime<Utc>,
    ) -> GateOutcome {
        let Some(header) = headers.get(AUTHORIZATION) else {
            return GateOutcome::NoHeader;
        };

        let Some(token) = header
            .to_str()
            .ok()
            .and_then(|value| extract_token_from_header(Some(value)))
        else {
            return GateOutcome::NotBearer;
        };

        let subject = match self.codec.extract_subject(token) {
            Ok(subject) => subject,
            Err(e) => {
                debug!("Ignoring bearer token: {}", e);
                return GateOutcome::Unparseable;
            }
        };

        if ctx.is_authenticated() {
            return GateOutcome::AlreadyAuthenticated;
        }

        let principal =
            match tokio::time::timeout(self.lookup_timeout, self.store.find_by_identity(&subject))
                .await
            {
                Ok(Ok(Some(principal))) => principal,
                Ok(Ok(None)) => {
                    debug!("Token subject has no principal: {}", subject);
                    return GateOutcome::PrincipalNotFound;
                }
                Ok(Err(e)) => {
                    warn!("Principal lookup failed for {}: {}", subject, e);
                    return GateOutcome::LookupFailed;
                }
                Err(_) => {
                    warn!(
                        "Principal lookup for {} timed out after {:?}",
                        subject, self.lookup_timeout
                    );
                    return GateOutcome::LookupTimedOut;
                }
            };

        let claims = match self.codec.verify(token, now) {
            Ok(claims) if claims.subject() == principal.identity => claims,
            Ok(_) => return GateOutcome::InvalidToken,
            Err(e) => {
                debug!("Token for {} rejected: {}", subject, e);
                return GateOutcome::InvalidToken;
            }
        };

        match ctx.authenticate(Authentication::new(principal, claims)) {
            Ok(()) => {
                debug!("Authenticated {}", subject);
                GateOutcome::Authenticated
            }
            Err(_) => GateOutcome::AlreadyAuthenticated,
        }
    }
}

#[async_trait]
impl Interceptor for AuthenticationGate {
    fn name(&self) -> &'static str {
        "authentication-gate"
    }

    async fn intercept(&self, request: &Parts, ctx: &mut SecurityContext) -> Decision {
        let outcome = self.authenticate(&request.headers, ctx).await;
        debug!("{} {} -> {:?}", request.method, request.uri.path(), outcome);
        Decision::Continue
    }
}
