//! Principal document schema
//!
//! Stores principal identity, profile fields and credential hash.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::{Principal, Role};
use crate::db::schemas::Metadata;

/// Collection name for principals
pub const PRINCIPAL_COLLECTION: &str = "principals";

/// Principal document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PrincipalDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Identity key (email)
    pub identity: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub role: Role,

    /// Argon2 password hash
    pub credential_hash: String,
}

impl PrincipalDoc {
    /// Documents that count as live principals.
    ///
    /// Shared by lookups and the unique index so a soft-deleted identity
    /// can be registered again.
    pub fn active_filter() -> Document {
        doc! { "metadata.is_deleted": false }
    }

    /// Index definitions applied when the collection is opened
    pub fn indexes() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "identity": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("identity_unique".to_string())
                    .partial_filter_expression(Self::active_filter())
                    .build(),
            ),
        )]
    }
}

impl From<Principal> for PrincipalDoc {
    fn from(principal: Principal) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            identity: principal.identity,
            first_name: principal.first_name,
            last_name: principal.last_name,
            role: principal.role,
            credential_hash: principal.credential_hash,
        }
    }
}

impl From<PrincipalDoc> for Principal {
    fn from(doc: PrincipalDoc) -> Self {
        Principal {
            identity: doc.identity,
            first_name: doc.first_name,
            last_name: doc.last_name,
            role: doc.role,
            credential_hash: doc.credential_hash,
        }
    }
}
