//! Authentication for tokengate
//!
//! Provides:
//! - Signed token generation and verification (HS256)
//! - Password hashing with Argon2
//! - Per-request security context
//! - Authentication gate and access policy interceptors
//! - Registration/login facade

pub mod context;
pub mod credentials;
pub mod facade;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod principal;
pub mod role;

pub use context::{Authentication, SecurityContext};
pub use credentials::CredentialAuthenticator;
pub use facade::{AuthFacade, AuthenticationRequest, AuthenticationResponse, RegisterRequest};
pub use gate::{AuthenticationGate, GateOutcome, DEFAULT_LOOKUP_TIMEOUT};
pub use jwt::{
    extract_token_from_header, Claims, ExtraClaims, SigningKey, TokenCodec, DEFAULT_TOKEN_TTL_MS,
};
pub use password::{hash_password, verify_password, Argon2Hasher, CredentialHasher};
pub use policy::AccessPolicy;
pub use principal::Principal;
pub use role::Role;
