//! HTTP server and request interceptors

pub mod http;
pub mod interceptor;

pub use http::{handle_request, run, AppState};
pub use interceptor::{Decision, Interceptor, InterceptorChain};

#[cfg(test)]
pub(crate) use http::test_state;
