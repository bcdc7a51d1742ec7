use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{decode, encode, DocumentStore};
use crate::errors::ServiceError;
use crate::toko::Toko;

/// In-process backing document, encoded the same way as the real backends.
/// Useful for tests and local experiments; can be told to fail saves.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    document: RwLock<Option<Vec<u8>>>,
    failing_saves: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryDocumentStore {
    /// A store with no document; `load` reports `NotFound`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_records(records: &[Toko]) -> Result<Self, ServiceError> {
        let mut store = Self::default();
        *store.document.get_mut() = Some(encode(records)?);
        Ok(store)
    }

    /// Make the next `n` saves fail with a persistence error.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Decoded current document, if any.
    pub async fn persisted(&self) -> Result<Option<Vec<Toko>>, ServiceError> {
        let doc = self.document.read().await;
        doc.as_deref().map(decode).transpose()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self) -> Result<Vec<Toko>, ServiceError> {
        let doc = self.document.read().await;
        match doc.as_deref() {
            Some(bytes) => decode(bytes),
            None => Err(ServiceError::NotFound("in-memory document has not been written".into())),
        }
    }

    async fn save(&self, records: &[Toko]) -> Result<(), ServiceError> {
        let fail = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(ServiceError::Persistence("injected save failure".into()));
        }
        let data = encode(records)?;
        *self.document.write().await = Some(data);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn injected_failures_are_consumed() -> Result<(), anyhow::Error> {
        let store = MemoryDocumentStore::empty();
        assert!(matches!(store.load().await, Err(ServiceError::NotFound(_))));

        store.fail_next_saves(1);
        assert!(store.save(&[Toko::new("A", 0.0, 0.0)]).await.is_err());
        assert_eq!(store.persisted().await?, None);

        store.save(&[Toko::new("A", 0.0, 0.0)]).await?;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().await?.len(), 1);
        Ok(())
    }
}
