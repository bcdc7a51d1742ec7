//! Persistence gateway for the store collection.
//!
//! The whole collection lives in one JSON document whose top-level value is an
//! array of records. There is no partial update: every save rewrites the
//! entire document, so the cost of a mutation grows with the document size.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{StorageBackend, StorageConfig};

use crate::errors::ServiceError;
use crate::toko::Toko;

pub mod file_store;
pub mod gcs_store;
pub mod memory_store;

pub use file_store::FileDocumentStore;
pub use gcs_store::GcsDocumentStore;
pub use memory_store::MemoryDocumentStore;

/// Loads and saves the entire backing document.
/// Implementations can be file-backed, object-store-backed, or in-memory.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch and decode the document. A missing document is `NotFound`.
    async fn load(&self) -> Result<Vec<Toko>, ServiceError>;
    /// Encode `records` and overwrite the document.
    async fn save(&self, records: &[Toko]) -> Result<(), ServiceError>;
    /// Short human label for logs.
    fn describe(&self) -> String;
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<Toko>, ServiceError> {
    serde_json::from_slice(bytes).map_err(|e| ServiceError::Deserialization(e.to_string()))
}

pub(crate) fn encode(records: &[Toko]) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(records).map_err(ServiceError::persistence)
}

/// Build the backend selected by configuration.
pub fn from_config(cfg: &StorageConfig) -> Result<Arc<dyn DocumentStore>, ServiceError> {
    let store: Arc<dyn DocumentStore> = match cfg.backend {
        StorageBackend::File => Arc::new(FileDocumentStore::new(&cfg.path)),
        StorageBackend::Gcs => Arc::new(GcsDocumentStore::new(
            &cfg.endpoint,
            &cfg.bucket,
            &cfg.object,
            cfg.access_token.clone(),
            cfg.timeout(),
        )?),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_non_array_documents() {
        assert!(matches!(decode(br#"{"nama_toko":"A"}"#), Err(ServiceError::Deserialization(_))));
        assert!(matches!(decode(b"[1, 2]"), Err(ServiceError::Deserialization(_))));
        assert_eq!(decode(b"[]").unwrap().len(), 0);
    }

    #[test]
    fn from_config_picks_backend() {
        let cfg = StorageConfig { backend: StorageBackend::File, path: "data/x.json".into(), ..Default::default() };
        let store = from_config(&cfg).unwrap();
        assert!(store.describe().contains("data/x.json"));

        let cfg = StorageConfig { bucket: "b".into(), object: "toko.json".into(), ..Default::default() };
        let store = from_config(&cfg).unwrap();
        assert_eq!(store.describe(), "gs://b/toko.json");
    }
}
