use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{decode, encode, DocumentStore};
use crate::errors::ServiceError;
use crate::toko::Toko;

/// Backing document kept in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    file_path: PathBuf,
}

impl FileDocumentStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { file_path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.file_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self) -> Result<Vec<Toko>, ServiceError> {
        match fs::read(&self.file_path).await {
            Ok(bytes) => decode(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServiceError::NotFound(format!("{} does not exist", self.file_path.display())))
            }
            Err(e) => Err(ServiceError::persistence(e)),
        }
    }

    async fn save(&self, records: &[Toko]) -> Result<(), ServiceError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }
        let data = encode(records)?;
        // write-then-rename so a crash never leaves a truncated document
        let tmp = self.temp_path();
        fs::write(&tmp, data).await.map_err(ServiceError::persistence)?;
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::persistence)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.file_path.display())
    }
}
