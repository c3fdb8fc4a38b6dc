//! In-memory principal store
//!
//! Used in dev mode when no MongoDB URI is configured, and by tests.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::auth::Principal;
use crate::db::PrincipalStore;
use crate::types::{Result, TokengateError};

/// Concurrent map of principals keyed by identity
#[derive(Debug, Default)]
pub struct MemoryPrincipalStore {
    principals: DashMap<String, Principal>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>> {
        Ok(self.principals.get(identity).map(|entry| entry.value().clone()))
    }

    async fn save(&self, principal: Principal) -> Result<()> {
        match self.principals.entry(principal.identity.clone()) {
            Entry::Occupied(_) => Err(TokengateError::DuplicateIdentity(principal.identity)),
            Entry::Vacant(slot) => {
                slot.insert(principal);
                Ok(())
            }
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
