//! MongoDB client and principal collection
//!
//! Pattern adapted from holo-host/rust/util_libs/db/src/mongodb

use async_trait::async_trait;
use bson::{doc, DateTime};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    Client, Collection, IndexModel,
};
use tracing::info;

use crate::auth::Principal;
use crate::db::schemas::{PrincipalDoc, PRINCIPAL_COLLECTION};
use crate::db::PrincipalStore;
use crate::types::{Result, TokengateError};

/// Server error code for unique index violations
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB");

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| TokengateError::Store(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| TokengateError::Store(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Open the principal collection, applying its indexes
    pub async fn principal_store(&self) -> Result<MongoPrincipalStore> {
        MongoPrincipalStore::open(&self.client, &self.db_name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// `PrincipalStore` backed by the `principals` collection
#[derive(Debug, Clone)]
pub struct MongoPrincipalStore {
    inner: Collection<PrincipalDoc>,
}

impl MongoPrincipalStore {
    async fn open(client: &Client, db_name: &str) -> Result<Self> {
        let inner = client
            .database(db_name)
            .collection::<PrincipalDoc>(PRINCIPAL_COLLECTION);

        let indexes: Vec<IndexModel> = PrincipalDoc::indexes()
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        inner.create_indexes(indexes).await?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl PrincipalStore for MongoPrincipalStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Principal>> {
        let mut filter = PrincipalDoc::active_filter();
        filter.insert("identity", identity);

        let found = self.inner.find_one(filter).await?;

        Ok(found.map(Principal::from))
    }

    async fn save(&self, principal: Principal) -> Result<()> {
        let identity = principal.identity.clone();
        let mut doc = PrincipalDoc::from(principal);
        let now = DateTime::now();
        doc.metadata.created_at = Some(now);
        doc.metadata.updated_at = Some(now);

        match self.inner.insert_one(doc).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(TokengateError::DuplicateIdentity(identity)),
            Err(e) => Err(TokengateError::Store(format!("Insert failed: {}", e))),
        }
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}
