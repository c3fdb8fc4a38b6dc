//! Per-request security context
//!
//! One `SecurityContext` is created empty for every inbound request, threaded
//! by `&mut` through the interceptor chain and the route handler, then dropped
//! with the request. It is never shared between requests.

use crate::auth::{Claims, Principal};

/// An authenticated principal together with the verified token claims
#[derive(Debug, Clone)]
pub struct Authentication {
    principal: Principal,
    claims: Claims,
}

impl Authentication {
    pub fn new(principal: Principal, claims: Claims) -> Self {
        Self { principal, claims }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// Holder of the currently authenticated principal, if any.
///
/// Set at most once: a second `authenticate` call leaves the first
/// authentication in place and hands the rejected value back.
#[derive(Debug, Default)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication.is_some()
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.authentication.as_ref().map(Authentication::principal)
    }

    /// Populate the context. Fails with the given value if already set.
    pub fn authenticate(&mut self, authentication: Authentication) -> Result<(), Authentication> {
        if self.authentication.is_some() {
            return Err(authentication);
        }
        self.authentication = Some(authentication);
        Ok(())
    }
}
