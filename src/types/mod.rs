//! Shared types for tokengate

pub mod error;

pub use error::{Result, TokengateError};
