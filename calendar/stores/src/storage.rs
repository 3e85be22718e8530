use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use calendar::asset::{ImageAsset, NewAsset, SourceType};
use calendar::ids::AssetId;
use calendar::store::CalendarStore;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;
use tracing::{info, warn};

/// An image file to be uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Object already exists. asset: {0}")]
    AlreadyExists(AssetId),
    #[error("Object not found. asset: {0}")]
    NotFound(AssetId),
    #[error("Object storage unavailable. reason: {0}")]
    Unavailable(String),
}

/// Image file storage, objects are addressed by asset id.
pub trait ObjectStorage: Send + Sync {
    /// Returns the public url of the object.  Uploading to an existing id fails unless `overwrite` is set.
    fn upload<'a>(
        &'a self,
        file: &'a UploadFile,
        asset_id: &'a AssetId,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<String, StorageError>>;

    fn delete<'a>(&'a self, asset: &'a ImageAsset) -> BoxFuture<'a, Result<(), StorageError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    base_url: String,
    objects: Mutex<HashMap<AssetId, UploadFile>>,
    offline: AtomicBool,
}

impl InMemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn contains(&self, asset_id: &AssetId) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(asset_id)
    }

    pub fn url(&self, asset_id: &AssetId) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), asset_id)
    }

    fn check_online(&self) -> Result<(), StorageError> {
        match self.offline.load(Ordering::SeqCst) {
            true => Err(StorageError::Unavailable("offline".to_string())),
            false => Ok(()),
        }
    }

    fn put(&self, file: &UploadFile, asset_id: &AssetId, overwrite: bool) -> Result<String, StorageError> {
        self.check_online()?;

        let mut objects = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !overwrite && objects.contains_key(asset_id) {
            return Err(StorageError::AlreadyExists(asset_id.clone()));
        }
        objects.insert(asset_id.clone(), file.clone());

        Ok(self.url(asset_id))
    }

    fn remove(&self, asset_id: &AssetId) -> Result<(), StorageError> {
        self.check_online()?;

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(asset_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(asset_id.clone()))
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn upload<'a>(
        &'a self,
        file: &'a UploadFile,
        asset_id: &'a AssetId,
        overwrite: bool,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        async move { self.put(file, asset_id, overwrite) }.boxed()
    }

    fn delete<'a>(&'a self, asset: &'a ImageAsset) -> BoxFuture<'a, Result<(), StorageError>> {
        async move { self.remove(&asset.id) }.boxed()
    }
}

/// Upload a file and add it as an asset.
///
/// The asset id is allocated before the upload, the asset is only added once the upload succeeded.
pub async fn import_upload(
    store: &mut CalendarStore,
    storage: &impl ObjectStorage,
    file: UploadFile,
) -> Result<AssetId, StorageError> {
    let asset_id = AssetId::new_random();
    let url = storage
        .upload(&file, &asset_id, false)
        .await
        .inspect_err(|error| warn!("Upload failed. name: '{}', error: {}", file.name, error))?;

    let UploadFile {
        name,
        width,
        height,
        ..
    } = file;
    let asset_id = store.add_asset(
        NewAsset {
            name,
            source_type: SourceType::Upload,
            url,
            thumbnail_url: None,
            original_width: width,
            original_height: height,
        },
        Some(asset_id),
    );

    info!("Imported upload. asset: {}", asset_id);
    Ok(asset_id)
}

#[derive(Debug, Default, PartialEq)]
pub struct DeleteReport {
    pub deleted: Vec<AssetId>,
    pub not_found: Vec<AssetId>,
    pub storage_failures: Vec<(AssetId, StorageError)>,
}

/// Delete assets, one at a time.
///
/// Each asset is removed from the document first, the stored file is deleted afterwards.  Storage failures do not
/// stop the removal, they are logged and reported.
pub async fn delete_assets(
    store: &mut CalendarStore,
    storage: &impl ObjectStorage,
    asset_ids: &[AssetId],
) -> DeleteReport {
    let mut report = DeleteReport::default();

    for asset_id in asset_ids {
        let asset = match store.delete_asset(asset_id) {
            Ok(asset) => asset,
            Err(_) => {
                warn!("Asset to delete not found. asset: {}", asset_id);
                report.not_found.push(asset_id.clone());
                continue;
            }
        };

        if asset.source_type == SourceType::Upload {
            if let Err(error) = storage.delete(&asset).await {
                warn!("Unable to delete stored file. asset: {}, error: {}", asset_id, error);
                report
                    .storage_failures
                    .push((asset_id.clone(), error));
            }
        }

        report.deleted.push(asset_id.clone());
    }

    report
}
