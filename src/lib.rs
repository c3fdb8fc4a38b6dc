//! tokengate - token issuing and request authentication
//!
//! Principals register or log in with an identity and password and receive a
//! signed, self-contained bearer token. Every incoming request passes through
//! an interceptor chain that turns a valid `Authorization: Bearer` header into
//! an authenticated per-request security context.
//!
//! ## Components
//!
//! - **auth**: token codec, credential hashing, authentication gate, facade
//! - **db**: principal stores (in-memory and MongoDB)
//! - **server**: hyper HTTP server and interceptor chain
//! - **routes**: `/auth/*`, `/me`, `/health`, `/version`

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, TokengateError};
