//! Registration and login orchestration
//!
//! Delegates credential hashing/verification and persistence to the
//! collaborators it was built with, then mints a token for the response.
//! No token is issued on any failure path.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::credentials::{hash_blocking, CredentialAuthenticator};
use crate::auth::{CredentialHasher, ExtraClaims, Principal, TokenCodec};
use crate::db::PrincipalStore;
use crate::types::{Result, TokengateError};

/// Body of `POST /auth/register`
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, alias = "firstname")]
    pub first_name: String,
    #[serde(default, alias = "lastname")]
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/authenticate`
#[derive(Clone, Deserialize)]
pub struct AuthenticationRequest {
    pub email: String,
    pub password: String,
}

/// Successful register/authenticate response
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationResponse {
    pub token: String,
}

/// Entry point for registration and login
#[derive(Clone)]
pub struct AuthFacade {
    store: Arc<dyn PrincipalStore>,
    hasher: Arc<dyn CredentialHasher>,
    authenticator: CredentialAuthenticator,
    codec: TokenCodec,
}

impl AuthFacade {
    pub fn new(
        store: Arc<dyn PrincipalStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: TokenCodec,
    ) -> Self {
        let authenticator = CredentialAuthenticator::new(Arc::clone(&store), Arc::clone(&hasher));
        Self {
            store,
            hasher,
            authenticator,
            codec,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn PrincipalStore> {
        &self.store
    }

    /// Create a principal with the default role and issue its first token
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthenticationResponse> {
        require_credentials(&request.email, &request.password)?;

        let credential_hash = hash_blocking(Arc::clone(&self.hasher), request.password).await?;
        let principal = Principal::new(
            request.email,
            request.first_name,
            request.last_name,
            credential_hash,
        );

        if let Err(e) = self.store.save(principal.clone()).await {
            if matches!(e, TokengateError::DuplicateIdentity(_)) {
                warn!("Registration rejected - identity exists: {}", principal.identity);
            }
            return Err(e);
        }

        info!("Registered new principal: {}", principal.identity);
        self.issue_token(&principal)
    }

    /// Verify credentials and issue a fresh token
    pub async fn authenticate(
        &self,
        request: AuthenticationRequest,
    ) -> Result<AuthenticationResponse> {
        require_credentials(&request.email, &request.password)?;

        self.authenticator
            .authenticate(&request.email, &request.password)
            .await?;

        let principal = self
            .store
            .find_by_identity(&request.email)
            .await?
            .ok_or_else(|| TokengateError::PrincipalNotFound(request.email.clone()))?;

        info!("Login successful: {}", principal.identity);
        self.issue_token(&principal)
    }

    fn issue_token(&self, principal: &Principal) -> Result<AuthenticationResponse> {
        let mut extra = ExtraClaims::new();
        extra.insert("role".into(), Value::from(principal.role.as_str()));

        let token = self.codec.generate(&principal.identity, &extra, Utc::now())?;
        Ok(AuthenticationResponse { token })
    }
}

fn require_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(TokengateError::BadRequest(
            "Missing required fields: email, password".into(),
        ));
    }
    Ok(())
}
