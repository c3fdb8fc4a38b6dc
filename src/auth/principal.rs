//! Authenticated identity record

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::Role;

/// Identity record owned by the principal store.
///
/// The identity key (an email address) is unique and stable. The credential
/// hash is opaque to everything except the credential hasher.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub identity: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Role,
    pub credential_hash: String,
}

impl Principal {
    /// Create a principal with the default (lowest-privilege) role
    pub fn new(
        identity: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        credential_hash: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role: Role::default(),
            credential_hash: credential_hash.into(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

// The credential hash stays out of logs
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("identity", &self.identity)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}
