//! Principal storage for tokengate
//!
//! The authentication core only talks to `PrincipalStore`. Two backends are
//! provided: an in-memory map for dev mode and tests, and MongoDB.
//! Pattern adapted from holo-host/rust/util_libs/db

pub mod memory;
pub mod mongo;
pub mod schemas;

use async_trait::async_trait;

use crate::auth::Principal;
use crate::types::Result;

pub use memory::MemoryPrincipalStore;
pub use mongo::{MongoClient, MongoPrincipalStore};
pub use schemas::{Metadata, PrincipalDoc, PRINCIPAL_COLLECTION};

/// Lookup and persistence of principal records
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Find a principal by its identity key
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>>;

    /// Persist a new principal.
    ///
    /// Fails with `DuplicateIdentity` when the identity key is already taken.
    async fn save(&self, principal: Principal) -> Result<()>;

    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;
}
