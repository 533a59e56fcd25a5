//! File-backed site configuration store.
//!
//! The document is kept as pretty-printed JSON. Writes go to a sibling
//! temporary file which is then renamed over the original, so readers see
//! either the old or the new document, never a partial one.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::db::RepositoryError;
use crate::models::SiteConfig;
use crate::store::{ConfigStore, StoreFuture};

/// Configuration store over a JSON file.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    /// Serializes writers; the last `store` wins.
    write_lock: Mutex<()>,
}

impl FileConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read the document, or the default one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be read and
    /// `RepositoryError::Serialization` if it is not a valid document.
    pub async fn read(&self) -> Result<SiteConfig, RepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.path.display(),
                    "Site config file missing, using defaults"
                );
                Ok(SiteConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the file cannot be written.
    pub async fn write(&self, config: &SiteConfig) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(config)?;
        let temp = self.temp_path();

        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Site config written");
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> StoreFuture<'_, SiteConfig> {
        Box::pin(self.read())
    }

    fn store(&self, config: SiteConfig) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.write(&config).await })
    }
}
