//! Credential verification against the principal store

use std::sync::Arc;
use tracing::warn;

use crate::auth::CredentialHasher;
use crate::db::PrincipalStore;
use crate::types::{Result, TokengateError};

/// Checks submitted identity/credential pairs.
///
/// Unknown identities and wrong credentials produce the same
/// `InvalidCredentials` error so callers cannot enumerate accounts.
#[derive(Clone)]
pub struct CredentialAuthenticator {
    store: Arc<dyn PrincipalStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl CredentialAuthenticator {
    pub fn new(store: Arc<dyn PrincipalStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    /// Verify `raw_credential` for `identity`
    pub async fn authenticate(&self, identity: &str, raw_credential: &str) -> Result<()> {
        let principal = match self.store.find_by_identity(identity).await? {
            Some(p) => p,
            None => {
                warn!("Login failed - principal not found: {}", identity);
                return Err(TokengateError::InvalidCredentials);
            }
        };

        let matches = verify_blocking(
            Arc::clone(&self.hasher),
            raw_credential.to_owned(),
            principal.credential_hash,
        )
        .await?;

        if !matches {
            warn!("Login failed - invalid password: {}", identity);
            return Err(TokengateError::InvalidCredentials);
        }

        Ok(())
    }
}

/// Run a credential hash on the blocking pool
pub(crate) async fn hash_blocking(hasher: Arc<dyn CredentialHasher>, raw: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&raw))
        .await
        .map_err(|e| TokengateError::Internal(format!("Hashing task failed: {}", e)))?
}

/// Run a credential check on the blocking pool
pub(crate) async fn verify_blocking(
    hasher: Arc<dyn CredentialHasher>,
    raw: String,
    hash: String,
) -> Result<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&raw, &hash))
        .await
        .map_err(|e| TokengateError::Internal(format!("Verification task failed: {}", e)))?
}
