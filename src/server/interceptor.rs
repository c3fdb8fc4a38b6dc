//! Request interceptor pipeline
//!
//! Every request runs through an ordered list of interceptors before it is
//! routed. Each stage sees the request head and the request's security
//! context and either lets the request continue or answers it directly.

use async_trait::async_trait;
use hyper::http::request::Parts;
use hyper::Response;
use std::sync::Arc;
use tracing::debug;

use crate::auth::SecurityContext;
use crate::routes::BoxBody;

/// Outcome of a single interceptor stage
pub enum Decision {
    /// Hand the request to the next stage (or the router)
    Continue,
    /// Stop here and send this response
    Respond(Response<BoxBody>),
}

impl Decision {
    pub fn is_continue(&self) -> bool {
        matches!(self, Decision::Continue)
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Stage name for logs
    fn name(&self) -> &'static str;

    async fn intercept(&self, request: &Parts, ctx: &mut SecurityContext) -> Decision;
}

/// Ordered list of interceptors
#[derive(Clone, Default)]
pub struct InterceptorChain {
    stages: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage; stages run in insertion order
    pub fn with(mut self, stage: impl Interceptor + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run all stages until one responds
    pub async fn run(&self, request: &Parts, ctx: &mut SecurityContext) -> Decision {
        for stage in &self.stages {
            match stage.intercept(request, ctx).await {
                Decision::Continue => {}
                respond => {
                    debug!("{} answered {}", stage.name(), request.uri.path());
                    return respond;
                }
            }
        }
        Decision::Continue
    }
}
