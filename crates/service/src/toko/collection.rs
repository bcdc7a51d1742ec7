use std::sync::Arc;
use std::time::Duration;

use common::metrics::{MUTATIONS_TOTAL, PERSISTENCE_FAILURES_TOTAL};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, Instrument};

use crate::errors::ServiceError;
use crate::storage::DocumentStore;
use crate::toko::Toko;

/// Ordered, positionally addressed store records mirrored to a backing document.
///
/// Every mutation holds the write lock across both the in-memory change and
/// the full-document save, so mutations within one process are serialised
/// end to end. When the save fails the change is undone before the lock is
/// released. Readers share the read lock and get cloned snapshots.
///
/// The change-save-undo section runs on its own task. A caller that stops
/// waiting (client disconnect, outer timeout) does not stop it, so memory
/// only ever holds what the backing document accepted.
///
/// Nothing coordinates two processes sharing one document: the last save wins.
pub struct TokoCollection {
    records: Arc<RwLock<Vec<Toko>>>,
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

/// How to take back an in-memory change whose save failed.
enum Undo {
    Pop,
    Restore(usize, Toko),
    Reinsert(usize, Toko),
}

impl Undo {
    fn apply(self, records: &mut Vec<Toko>) {
        match self {
            Undo::Pop => {
                records.pop();
            }
            Undo::Restore(i, previous) => records[i] = previous,
            Undo::Reinsert(i, removed) => records.insert(i, removed),
        }
    }
}

impl TokoCollection {
    /// Load the backing document. Failure here means there is nothing to serve.
    pub async fn load(store: Arc<dyn DocumentStore>, timeout: Duration) -> Result<Self, ServiceError> {
        let records = tokio::time::timeout(timeout, store.load())
            .await
            .map_err(|_| ServiceError::Persistence(format!("loading {} timed out after {timeout:?}", store.describe())))??;
        info!(source = %store.describe(), count = records.len(), "store collection loaded");
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
            store,
            timeout,
        })
    }

    /// Full ordered snapshot.
    pub async fn all(&self) -> Vec<Toko> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn get(&self, index: i64) -> Result<Toko, ServiceError> {
        let records = self.records.read().await;
        let i = position(index, records.len())?;
        Ok(records[i].clone())
    }

    /// `OutOfRange` unless `index` currently addresses a record.
    pub async fn check_index(&self, index: i64) -> Result<(), ServiceError> {
        position(index, self.len().await).map(|_| ())
    }

    #[instrument(skip_all, fields(nama_toko = record.nama_toko().unwrap_or_default()))]
    pub async fn append(&self, record: Toko) -> Result<Toko, ServiceError> {
        let (record, index) = self
            .commit("append", move |records| {
                records.push(record.clone());
                Ok(((record, records.len() - 1), Undo::Pop))
            })
            .await?;
        info!(index, "store appended");
        Ok(record)
    }

    #[instrument(skip(self, record))]
    pub async fn replace_at(&self, index: i64, record: Toko) -> Result<Toko, ServiceError> {
        let record = self
            .commit("replace", move |records| {
                let i = position(index, records.len())?;
                let previous = std::mem::replace(&mut records[i], record.clone());
                Ok((record, Undo::Restore(i, previous)))
            })
            .await?;
        info!(nama_toko = record.nama_toko().unwrap_or_default(), "store replaced");
        Ok(record)
    }

    /// Remove and return the record at `index`; later records shift down by one.
    #[instrument(skip(self))]
    pub async fn remove_at(&self, index: i64) -> Result<Toko, ServiceError> {
        let (removed, remaining) = self
            .commit("remove", move |records| {
                let i = position(index, records.len())?;
                let removed = records.remove(i);
                Ok(((removed.clone(), records.len()), Undo::Reinsert(i, removed)))
            })
            .await?;
        info!(nama_toko = removed.nama_toko().unwrap_or_default(), remaining, "store removed");
        Ok(removed)
    }

    /// Apply `change` under the write lock and save the result, undoing the
    /// change if the save fails. Runs to completion even if the returned
    /// future is dropped.
    async fn commit<T, F>(&self, op: &'static str, change: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Vec<Toko>) -> Result<(T, Undo), ServiceError> + Send + 'static,
    {
        let records = self.records.clone();
        let store = self.store.clone();
        let timeout = self.timeout;
        let task = tokio::spawn(
            async move {
                let mut records = records.write_owned().await;
                let (output, undo) = change(&mut *records)?;
                if let Err(e) = persist(store.as_ref(), timeout, &records[..]).await {
                    undo.apply(&mut *records);
                    return Err(e);
                }
                MUTATIONS_TOTAL.with_label_values(&[op]).inc();
                Ok::<_, ServiceError>(output)
            }
            .in_current_span(),
        );
        task.await
            .map_err(|e| ServiceError::Persistence(format!("{op} task did not finish: {e}")))?
    }
}

async fn persist(store: &dyn DocumentStore, timeout: Duration, records: &[Toko]) -> Result<(), ServiceError> {
    let result = match tokio::time::timeout(timeout, store.save(records)).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Persistence(format!(
            "saving {} timed out after {timeout:?}",
            store.describe()
        ))),
    };
    if let Err(e) = &result {
        PERSISTENCE_FAILURES_TOTAL.inc();
        error!(error = %e, target = %store.describe(), "save failed; mutation rolled back");
    }
    result
}

fn position(index: i64, len: usize) -> Result<usize, ServiceError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(ServiceError::OutOfRange { index, len })
}
