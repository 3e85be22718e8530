use std::path::{Path, PathBuf};

use calendar::store::CalendarStore;
use stores::adapter::{PersistenceAdapter, RemoteOutcome};
use stores::cache::FileCache;
use stores::directory::DirectoryRemote;
use stores::rows::EntityRef;
use tracing::{debug, info, warn};

/// A workspace directory: the table files of the remote store in `store/` and the local snapshot cache.
pub(crate) struct Workspace {
    path: PathBuf,
    adapter: PersistenceAdapter<DirectoryRemote, FileCache>,
}

impl Workspace {
    pub(crate) fn open(path: &Path) -> Self {
        let remote = DirectoryRemote::new(path.join("store"));
        let cache = FileCache::new(path.join("snapshot.json"));

        Self {
            path: path.to_path_buf(),
            adapter: PersistenceAdapter::new(remote, cache),
        }
    }

    pub(crate) async fn load(&self) -> anyhow::Result<CalendarStore> {
        let store = match self.adapter.load().await?.into_snapshot() {
            Some(snapshot) => CalendarStore::from_snapshot(snapshot),
            None => {
                debug!("Empty workspace. path: {:?}", self.path);
                CalendarStore::new()
            }
        };

        Ok(store)
    }

    pub(crate) async fn save(&self, store: &CalendarStore) -> anyhow::Result<()> {
        let report = self.adapter.save(&store.snapshot()).await?;

        match report.remote {
            RemoteOutcome::Saved => info!("Saved workspace. path: {:?}", self.path),
            RemoteOutcome::Failed {
                entity,
                error,
            } => warn!(
                "Workspace store not updated, changes kept in the local snapshot. entity: {:?}, error: {}",
                entity, error
            ),
            RemoteOutcome::Superseded => {}
        }

        Ok(())
    }

    /// Delete the rows of an entity from the workspace store.
    ///
    /// A failure leaves orphaned rows behind, the document itself is still saved by the caller.
    pub(crate) async fn delete(&self, entity: EntityRef) {
        if let Err(error) = self
            .adapter
            .delete_entity(entity.clone())
            .await
        {
            warn!("Unable to delete rows from the workspace store. entity: {}, error: {}", entity, error);
        }
    }

    /// Delete the rows of every entity of `previous` that is not in `next`.
    pub(crate) async fn delete_missing(&self, previous: &CalendarStore, next: &CalendarStore) {
        let projects = previous
            .projects()
            .iter()
            .filter(|project| next.get_project_by_id(&project.id).is_none())
            .map(|project| EntityRef::Project(project.id.clone()));
        let assets = previous
            .assets()
            .iter()
            .filter(|asset| next.get_asset_by_id(&asset.id).is_none())
            .map(|asset| EntityRef::Asset(asset.id.clone()));
        let groups = previous
            .groups()
            .iter()
            .filter(|group| next.get_group_by_id(&group.id).is_none())
            .map(|group| EntityRef::Group(group.id.clone()));

        let entities: Vec<EntityRef> = projects
            .chain(assets)
            .chain(groups)
            .collect();
        for entity in entities {
            self.delete(entity).await;
        }
    }
}
