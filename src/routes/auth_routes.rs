//! HTTP Routes for Authentication
//!
//! Public endpoints that hand out tokens:
//! - POST /auth/register     - Create a principal and get a token
//! - POST /auth/authenticate - Check credentials and get a token

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::auth::{AuthenticationRequest, RegisterRequest};
use crate::routes::{error_response, json_response, BoxBody, ErrorResponse};
use crate::server::AppState;
use crate::types::{Result, TokengateError};

/// Largest accepted JSON body
const MAX_BODY_BYTES: usize = 10240;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn parse_json_body<B, T>(req: Request<B>) -> Result<T>
where
    B: Body,
    B::Error: Into<BoxError>,
    T: for<'de> Deserialize<'de>,
{
    // Stop reading as soon as the cap is crossed
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                TokengateError::BadRequest("Request body too large".into())
            } else {
                TokengateError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?;

    Ok(serde_json::from_slice(&body.to_bytes())?)
}

/// Log server-side failures; client errors are already logged by the facade
fn failure_response(action: &str, err: TokengateError) -> Response<BoxBody> {
    if err.status_code().is_server_error() {
        warn!("{} failed: {}", action, err);
    }
    error_response(&err)
}

/// POST /auth/register
///
/// Body `{firstName, lastName, email, password}`. Returns `{token}`.
async fn handle_register<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    match state.facade.register(body).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => failure_response("Registration", e),
    }
}

/// POST /auth/authenticate
///
/// Body `{email, password}`. Returns `{token}` or 401 on bad credentials.
async fn handle_authenticate<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body: AuthenticationRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    match state.facade.authenticate(body).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => failure_response("Authentication", e),
    }
}

/// Handle `/auth/*` requests
pub async fn handle_auth_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::POST, "/auth/register") => handle_register(req, state).await,
        (&Method::POST, "/auth/authenticate") => handle_authenticate(req, state).await,

        (_, "/auth/register") | (_, "/auth/authenticate") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse::new("Method not allowed", None),
        ),

        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse::new("Auth endpoint not found", None),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_state;
    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::body::Frame;
    use serde_json::{json, Value};
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Context, Poll};

    /// Endless-looking body that records how many bytes were read from it
    struct CountingBody {
        chunk: usize,
        chunks_left: usize,
        pulled: Arc<AtomicUsize>,
    }

    impl Body for CountingBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<std::result::Result<Frame<Bytes>, Infallible>>> {
            if self.chunks_left == 0 {
                return Poll::Ready(None);
            }
            self.chunks_left -= 1;
            self.pulled.fetch_add(self.chunk, Ordering::SeqCst);
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b' '; self.chunk])))))
        }
    }

    fn post(path: &str, body: Value) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: Response<BoxBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let state = test_state();

        let response = handle_auth_request(
            post(
                "/auth/register",
                json!({ "firstName": "Ada", "lastName": "Lovelace", "email": "a@x.com", "password": "p" }),
            ),
            state.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["token"].is_string());

        let response = handle_auth_request(
            post("/auth/authenticate", json!({ "email": "a@x.com", "password": "p" })),
            state.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"].as_str().unwrap().to_string();
        assert_eq!(
            state.facade.codec().extract_subject(&token).unwrap(),
            "a@x.com"
        );
    }

    #[tokio::test]
    async fn test_wrong_password_is_401() {
        let state = test_state();
        handle_auth_request(
            post("/auth/register", json!({ "email": "a@x.com", "password": "p" })),
            state.clone(),
        )
        .await;

        let response = handle_auth_request(
            post("/auth/authenticate", json!({ "email": "a@x.com", "password": "nope" })),
            state,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_409() {
        let state = test_state();
        let register = || post("/auth/register", json!({ "email": "a@x.com", "password": "p" }));

        assert_eq!(
            handle_auth_request(register(), state.clone()).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            handle_auth_request(register(), state).await.status(),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let state = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/authenticate")
            .body(Full::new(Bytes::from_static(b"{not json")))
            .unwrap();

        let response = handle_auth_request(req, state).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_body_is_400() {
        let state = test_state();
        let padding = "x".repeat(MAX_BODY_BYTES);
        let response = handle_auth_request(
            post("/auth/authenticate", json!({ "email": padding, "password": "p" })),
            state,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_stream_rejected_without_buffering() {
        let state = test_state();
        let chunk = 64 * 1024;
        let pulled = Arc::new(AtomicUsize::new(0));
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/authenticate")
            .body(CountingBody {
                chunk,
                chunks_left: 1024,
                pulled: Arc::clone(&pulled),
            })
            .unwrap();

        let response = handle_auth_request(req, state).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Bad request: Request body too large"
        );
        assert!(pulled.load(Ordering::SeqCst) <= MAX_BODY_BYTES + chunk);
    }

    #[tokio::test]
    async fn test_method_and_path_errors() {
        let state = test_state();

        let req = Request::builder()
            .method(Method::GET)
            .uri("/auth/register")
            .body(Full::new(Bytes::new()))
            .unwrap();
        assert_eq!(
            handle_auth_request(req, state.clone()).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );

        let response = handle_auth_request(post("/auth/refresh", json!({})), state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
