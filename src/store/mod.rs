//! Answer store: durable catalog persistence.
//!
//! The catalog is serialized as one opaque JSON blob behind the
//! [`BlobStore`] boundary. [`AnswerStore`] owns encoding, decoding,
//! seeding, corruption detection, and import/export; it applies no business
//! rules.

mod sqlite;

pub use sqlite::SqliteBlobStore;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::catalog::{Catalog, CATALOG_VERSION};
use crate::error::{StoreError, StoreResult};

/// Fixed key under which the catalog blob is stored.
pub const CATALOG_KEY: &str = "catalog";

/// Persistence boundary: opaque byte blobs keyed by a fixed identifier.
///
/// Implementations only need durable `get`/`set`; all schema knowledge
/// lives in [`AnswerStore`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    /// Durably overwrite the blob stored under `key`.
    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

/// Catalog (de)serialization over a [`BlobStore`].
#[derive(Clone)]
pub struct AnswerStore {
    blobs: Arc<dyn BlobStore>,
}

impl AnswerStore {
    /// Create an answer store over the given blob backend
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Load the persisted catalog.
    ///
    /// Absent bytes seed a fresh default catalog. Bytes that exist but do
    /// not decode, carry a version newer than this build, or fail
    /// structural validation report [`StoreError::Corruption`]; recovery
    /// policy belongs to the caller.
    pub async fn load(&self) -> StoreResult<Catalog> {
        match self.blobs.get(CATALOG_KEY).await? {
            None => {
                info!("No persisted catalog found, seeding defaults");
                Ok(Catalog::seeded())
            }
            Some(bytes) => {
                let catalog = decode(&bytes)?;
                catalog.validate()?;
                Ok(catalog)
            }
        }
    }

    /// Atomically overwrite the persisted catalog.
    ///
    /// The backend writes the whole blob in one upsert; combined with the
    /// gateway's mutation serialization, a concurrent `load()` never
    /// observes a partially written catalog.
    pub async fn persist(&self, catalog: &Catalog) -> StoreResult<()> {
        let bytes = encode(catalog)?;
        self.blobs.set(CATALOG_KEY, &bytes).await
    }

    /// Serialize the persisted catalog for backup
    pub async fn export(&self) -> StoreResult<Vec<u8>> {
        let catalog = self.load().await?;
        encode(&catalog)
    }

    /// Replace the persisted catalog wholesale from exported bytes.
    ///
    /// Per-note validation is skipped; callers pre-validate. The bytes must
    /// still decode as a catalog.
    pub async fn import(&self, bytes: &[u8]) -> StoreResult<Catalog> {
        let catalog = decode(bytes)?;
        self.persist(&catalog).await?;
        Ok(catalog)
    }

    /// Replace the persisted catalog with the seeded default set,
    /// discarding all notes
    pub async fn reset(&self) -> StoreResult<Catalog> {
        let catalog = Catalog::seeded();
        self.persist(&catalog).await?;
        Ok(catalog)
    }
}

/// Encode a catalog as its self-describing export form
pub fn encode(catalog: &Catalog) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(catalog)?)
}

/// Decode catalog bytes, mapping decode failures and version skew to
/// corruption
pub fn decode(bytes: &[u8]) -> StoreResult<Catalog> {
    let catalog: Catalog =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corruption {
            message: format!("catalog bytes failed to decode: {}", e),
        })?;

    if catalog.version > CATALOG_VERSION {
        return Err(StoreError::Corruption {
            message: format!(
                "catalog version {} is newer than supported version {}",
                catalog.version, CATALOG_VERSION
            ),
        });
    }

    Ok(catalog)
}
