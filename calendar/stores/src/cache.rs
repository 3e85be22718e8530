use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use calendar::snapshot::AppStateSnapshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::directory::to_pretty_json;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache IO error. path: {path}, cause: {cause}")]
    Io { path: PathBuf, cause: std::io::Error },
    #[error("Invalid cache content. path: {path}, cause: {cause}")]
    Invalid { path: PathBuf, cause: serde_json::Error },
    #[error("Unable to encode snapshot. cause: {0}")]
    Encode(serde_json::Error),
}

/// The local fallback copy of the last saved snapshot.
pub trait LocalCache: Send + Sync {
    /// `None` when nothing has been cached yet.
    fn load(&self) -> BoxFuture<'_, Result<Option<AppStateSnapshot>, CacheError>>;

    fn store<'a>(&'a self, snapshot: &'a AppStateSnapshot) -> BoxFuture<'a, Result<(), CacheError>>;
}

/// A snapshot file, written as pretty printed JSON.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_file(&self) -> Result<Option<AppStateSnapshot>, CacheError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cached snapshot. path: {:?}", self.path);
                return Ok(None);
            }
            Err(cause) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    cause,
                })
            }
        };

        let snapshot = serde_json::from_slice(&content).map_err(|cause| CacheError::Invalid {
            path: self.path.clone(),
            cause,
        })?;

        info!("Loaded cached snapshot. path: {:?}", self.path);
        Ok(Some(snapshot))
    }

    async fn store_file(&self, content: Vec<u8>) -> Result<(), CacheError> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|cause| CacheError::Io {
                    path: parent.to_path_buf(),
                    cause,
                })?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|cause| CacheError::Io {
                path: self.path.clone(),
                cause,
            })?;

        debug!("Stored snapshot. path: {:?}", self.path);
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn load(&self) -> BoxFuture<'_, Result<Option<AppStateSnapshot>, CacheError>> {
        self.load_file().boxed()
    }

    fn store<'a>(&'a self, snapshot: &'a AppStateSnapshot) -> BoxFuture<'a, Result<(), CacheError>> {
        let content = to_pretty_json(snapshot).map_err(CacheError::Encode);
        async move { self.store_file(content?).await }.boxed()
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    snapshot: Mutex<Option<AppStateSnapshot>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: AppStateSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<AppStateSnapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The number of stored snapshots.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocalCache for MemoryCache {
    fn load(&self) -> BoxFuture<'_, Result<Option<AppStateSnapshot>, CacheError>> {
        let snapshot = self.snapshot();
        async move { Ok(snapshot) }.boxed()
    }

    fn store<'a>(&'a self, snapshot: &'a AppStateSnapshot) -> BoxFuture<'a, Result<(), CacheError>> {
        *self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use calendar::project::{CalendarType, Format, Orientation};
    use calendar::store::CalendarStore;
    use tempfile::tempdir;
    use util::test::build_temp_file;

    use super::*;

    #[tokio::test]
    async fn file_cache_round_trip() {
        // given
        let temp_dir = tempdir().unwrap();
        let (path, _file_name) = build_temp_file(&temp_dir, "snapshot", "json");
        let cache = FileCache::new(path.clone());
        let mut store = CalendarStore::new();
        store.create_project("Family".to_string(), CalendarType::Wall, Format::A4, Orientation::Portrait);
        let snapshot = store.snapshot();

        // when
        cache.store(&snapshot).await.unwrap();
        let loaded = cache.load().await.unwrap();

        // then
        assert_eq!(loaded, Some(snapshot));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n    \"version\": 1,"));
        assert!(content.ends_with("}\n"));
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        // given
        let temp_dir = tempdir().unwrap();
        let (path, _file_name) = build_temp_file(&temp_dir, "missing", "json");

        // expect
        assert!(FileCache::new(path)
            .load()
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        // given
        let temp_dir = tempdir().unwrap();
        let (path, _file_name) = build_temp_file(&temp_dir, "corrupt", "json");
        std::fs::write(&path, "[1, 2").unwrap();

        // when
        let result = FileCache::new(path).load().await;

        // then
        assert!(matches!(result, Err(CacheError::Invalid { .. })));
    }
}
