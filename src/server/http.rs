//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Every request gets
//! a fresh security context that the interceptor chain fills in before routing.

use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{
    AccessPolicy, Argon2Hasher, AuthFacade, AuthenticationGate, CredentialHasher,
    SecurityContext, TokenCodec,
};
use crate::config::Args;
use crate::db::PrincipalStore;
use crate::routes::{self, cors_preflight, json_response, BoxBody, BoxError, ErrorResponse};
use crate::server::{Decision, InterceptorChain};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub facade: AuthFacade,
    /// Runs before every routed request: authentication gate, then access policy
    pub chain: InterceptorChain,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn PrincipalStore>) -> Result<Self> {
        let key = Arc::new(args.signing_key()?);
        let codec = TokenCodec::new(key, args.token_ttl())?;
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher);

        let chain = InterceptorChain::new()
            .with(AuthenticationGate::new(
                codec.clone(),
                Arc::clone(&store),
                args.lookup_timeout(),
            ))
            .with(AccessPolicy::default());

        Ok(Self {
            facade: AuthFacade::new(store, hasher, codec),
            args,
            chain,
            started_at: Instant::now(),
        })
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "tokengate listening on {} (store: {})",
        state.args.listen,
        state.facade.store().backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - do not use the built-in signing key in production");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, hyper::Error>(handle_request(state, addr, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route a single request through the interceptor chain
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    info!("[{}] {} {}", addr, parts.method, path);

    if parts.method == Method::OPTIONS {
        return cors_preflight();
    }

    let mut ctx = SecurityContext::new();
    if let Decision::Respond(response) = state.chain.run(&parts, &mut ctx).await {
        return response;
    }

    if path == "/auth" || path.starts_with("/auth/") {
        let req = Request::from_parts(parts, body);
        return routes::handle_auth_request(req, Arc::clone(&state)).await;
    }

    match (&parts.method, path.as_str()) {
        (&Method::GET, "/health") => routes::health_check(state),
        (&Method::GET, "/version") => routes::version_info(),
        (&Method::GET, "/me") => routes::handle_me(&ctx),

        (_, "/health") | (_, "/version") | (_, "/me") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse::new("Method not allowed", None),
        ),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse::new(format!("Not found: {}", path), None),
        ),
    }
}

/// In-memory state on the development key, for handler tests
#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    use clap::Parser;

    let args = Args::parse_from(["tokengate", "--dev-mode", "--lookup-timeout-ms", "1000"]);
    let store: Arc<dyn PrincipalStore> = Arc::new(crate::db::MemoryPrincipalStore::new());
    Arc::new(AppState::new(args, store).unwrap())
}
