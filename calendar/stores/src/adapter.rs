//! Remote first, local always.
//!
//! Saves write every row to the remote backend, one at a time, and then mirror the snapshot into the local cache
//! whether or not the remote write succeeded.  Loads try the remote backend first and fall back to the local cache
//! when the remote is unavailable or empty.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use calendar::group::{dedupe_groups, ImageGroup};
use calendar::snapshot::AppStateSnapshot;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, RemoteStore};
use crate::cache::{CacheError, LocalCache};
use crate::rows::{EntityRef, GroupRow, Row, SnapshotRows, Table};
use crate::sequence::{RequestSequence, RequestToken};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub debounce_ms: u64,
    pub local_cache_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            local_cache_path: PathBuf::from("snapshot.json"),
        }
    }
}

impl PersistenceConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Local cache error. cause: {0}")]
    Cache(#[from] CacheError),
    #[error("Remote backend error. cause: {0}")]
    Backend(#[from] BackendError),
    #[error("Writer has shut down")]
    WriterClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    Saved,
    /// The remote write stopped at the first failure, `entity` is `None` when no single row was at fault.
    Failed {
        entity: Option<EntityRef>,
        error: BackendError,
    },
    /// A newer save was issued, the remaining rows and the local write were skipped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub rows_written: usize,
    pub remote: RemoteOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Remote(AppStateSnapshot),
    Local(AppStateSnapshot),
    Empty,
    /// A newer load was issued, this result must not be applied.
    Stale,
}

impl LoadOutcome {
    pub fn into_snapshot(self) -> Option<AppStateSnapshot> {
        match self {
            LoadOutcome::Remote(snapshot) | LoadOutcome::Local(snapshot) => Some(snapshot),
            LoadOutcome::Empty | LoadOutcome::Stale => None,
        }
    }
}

pub struct PersistenceAdapter<R, C> {
    remote: R,
    cache: C,
    saves: RequestSequence,
    loads: RequestSequence,
}

impl<R: RemoteStore, C: LocalCache> PersistenceAdapter<R, C> {
    pub fn new(remote: R, cache: C) -> Self {
        Self {
            remote,
            cache,
            saves: RequestSequence::new(),
            loads: RequestSequence::new(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// The request is issued when this is called, a save issued later supersedes it.
    pub fn save<'a>(
        &'a self,
        snapshot: &'a AppStateSnapshot,
    ) -> impl Future<Output = Result<SaveReport, PersistenceError>> + Send + 'a {
        let token = self.saves.issue();
        async move {
            let rows = SnapshotRows::from_snapshot(snapshot, Utc::now());
            let memberships: HashSet<String> = rows
                .memberships
                .iter()
                .map(|membership| membership.key())
                .collect();

            let (rows_written, remote) = self
                .save_rows(token, rows.into_rows(), &memberships)
                .await;

            if matches!(remote, RemoteOutcome::Superseded) {
                debug!("Save superseded. token: {}, rows_written: {}", token.value(), rows_written);
                return Ok(SaveReport {
                    rows_written,
                    remote,
                });
            }

            self.cache.store(snapshot).await?;

            match &remote {
                RemoteOutcome::Failed {
                    entity,
                    error,
                } => warn!(
                    "Remote save failed, saved locally. entity: {:?}, error: {}, rows_written: {}",
                    entity, error, rows_written
                ),
                _ => info!("Saved snapshot. rows: {}", rows_written),
            }

            Ok(SaveReport {
                rows_written,
                remote,
            })
        }
    }

    async fn save_rows(
        &self,
        token: RequestToken,
        rows: impl Iterator<Item = Row>,
        memberships: &HashSet<String>,
    ) -> (usize, RemoteOutcome) {
        let mut rows_written = 0;
        for row in rows {
            if !self.saves.is_latest(token) {
                return (rows_written, RemoteOutcome::Superseded);
            }

            let entity = EntityRef::from(&row);
            if let Err(error) = self.remote.upsert(row).await {
                return (rows_written, RemoteOutcome::Failed {
                    entity: Some(entity),
                    error,
                });
            }
            rows_written += 1;
        }

        match self.prune_memberships(memberships).await {
            Ok(()) => (rows_written, RemoteOutcome::Saved),
            Err((entity, error)) => (rows_written, RemoteOutcome::Failed {
                entity,
                error,
            }),
        }
    }

    /// Delete junction rows that no longer exist in the saved snapshot, so that loads do not restore them.
    async fn prune_memberships(
        &self,
        memberships: &HashSet<String>,
    ) -> Result<(), (Option<EntityRef>, BackendError)> {
        let existing = self
            .remote
            .scan(Table::Memberships)
            .await
            .map_err(|error| (None, error))?;

        for row in existing {
            if memberships.contains(&row.key()) {
                continue;
            }
            let entity = EntityRef::from(&row);
            self.remote
                .delete(entity.clone())
                .await
                .map_err(|error| (Some(entity.clone()), error))?;
            debug!("Pruned membership. entity: {}", entity);
        }
        Ok(())
    }

    /// The request is issued when this is called, a load issued later makes this one [`LoadOutcome::Stale`].
    pub fn load(&self) -> impl Future<Output = Result<LoadOutcome, PersistenceError>> + Send + '_ {
        let token = self.loads.issue();
        async move {
            let remote = self
                .load_remote()
                .await
                .inspect_err(|error| warn!("Remote load failed, falling back to the local cache. error: {}", error))
                .ok()
                .flatten();
            let local = self.cache.load().await;

            if !self.loads.is_latest(token) {
                debug!("Discarding stale load. token: {}", token.value());
                return Ok(LoadOutcome::Stale);
            }

            match (remote, local) {
                (Some(mut snapshot), local) => {
                    match local {
                        Ok(Some(local)) => restore_session(&mut snapshot, &local),
                        Ok(None) => {}
                        Err(error) => warn!("Ignoring unreadable local cache. error: {}", error),
                    }
                    info!("Loaded snapshot from remote. projects: {}", snapshot.projects.len());
                    Ok(LoadOutcome::Remote(snapshot))
                }
                (None, Ok(Some(snapshot))) => {
                    info!("Loaded snapshot from local cache. projects: {}", snapshot.projects.len());
                    Ok(LoadOutcome::Local(snapshot))
                }
                (None, Ok(None)) => {
                    info!("No saved snapshot");
                    Ok(LoadOutcome::Empty)
                }
                (None, Err(error)) => {
                    error!("Unable to load snapshot. error: {}", error);
                    Err(error.into())
                }
            }
        }
    }

    async fn load_remote(&self) -> Result<Option<AppStateSnapshot>, BackendError> {
        let mut rows = Vec::new();
        for table in Table::ALL {
            rows.extend(self.remote.scan(table).await?);
        }

        let mut rows = SnapshotRows::from_rows(rows);
        if rows.is_empty() {
            return Ok(None);
        }

        let groups = dedupe_groups(
            rows.groups
                .into_iter()
                .map(ImageGroup::from)
                .collect(),
        );
        rows.groups = groups
            .iter()
            .map(GroupRow::from)
            .collect();

        Ok(Some(rows.into_snapshot()))
    }

    /// Delete the row of an entity; deleting an asset or a group also deletes its membership rows.
    pub async fn delete_entity(&self, entity: EntityRef) -> Result<bool, BackendError> {
        let memberships: Vec<Row> = match &entity {
            EntityRef::Asset(id) => self
                .remote
                .scan(Table::Memberships)
                .await?
                .into_iter()
                .filter(|row| matches!(row, Row::Membership(membership) if membership.asset_id == *id))
                .collect(),
            EntityRef::Group(id) => self
                .remote
                .scan(Table::Memberships)
                .await?
                .into_iter()
                .filter(|row| matches!(row, Row::Membership(membership) if membership.group_id == *id))
                .collect(),
            EntityRef::Project(_) | EntityRef::Membership { .. } => vec![],
        };

        for row in memberships.iter() {
            self.remote.delete(EntityRef::from(row)).await?;
        }

        let deleted = self.remote.delete(entity.clone()).await?;
        info!("Deleted entity. entity: {}, memberships: {}, found: {}", entity, memberships.len(), deleted);
        Ok(deleted)
    }
}

/// The active project and page are session state, they are only kept in the local cache.
fn restore_session(snapshot: &mut AppStateSnapshot, local: &AppStateSnapshot) {
    let Some(active_project_id) = &local.active_project_id else {
        return;
    };

    if snapshot
        .projects
        .iter()
        .any(|project| project.id == *active_project_id)
    {
        snapshot.active_project_id = Some(active_project_id.clone());
        snapshot.active_page_index = local.active_page_index;
    }
}

#[cfg(test)]
mod tests {
    use calendar::asset::{NewAsset, SourceType};
    use calendar::ids::AssetId;
    use calendar::project::{CalendarType, Format, Orientation};
    use calendar::store::CalendarStore;

    use super::*;
    use crate::cache::MemoryCache;
    use crate::memory::InMemoryRemote;

    fn store() -> CalendarStore {
        let mut store = CalendarStore::new();
        store.create_project("Family".to_string(), CalendarType::Wall, Format::A4, Orientation::Portrait);
        store.add_asset(
            NewAsset {
                name: "beach".to_string(),
                source_type: SourceType::Url,
                url: "https://example.com/beach.jpg".to_string(),
                thumbnail_url: None,
                original_width: 640,
                original_height: 480,
            },
            Some(AssetId::from("a1")),
        );
        let group_id = store.create_group("Nature".to_string(), None);
        store
            .add_images_to_group(&group_id, &[AssetId::from("a1")])
            .unwrap();
        store
    }

    fn adapter() -> PersistenceAdapter<InMemoryRemote, MemoryCache> {
        PersistenceAdapter::new(InMemoryRemote::new(), MemoryCache::new())
    }

    #[tokio::test]
    async fn save_writes_every_row_and_the_local_cache() {
        // given
        let adapter = adapter();
        let snapshot = store().snapshot();

        // when
        let report = adapter.save(&snapshot).await.unwrap();

        // then
        // project, asset, group and one membership
        assert_eq!(report, SaveReport {
            rows_written: 4,
            remote: RemoteOutcome::Saved
        });
        assert_eq!(adapter.cache().snapshot(), Some(snapshot));
        assert_eq!(adapter.remote().rows(Table::Memberships).len(), 1);
    }

    #[tokio::test]
    async fn local_cache_is_written_when_the_remote_is_offline() {
        // given
        let adapter = adapter();
        adapter.remote().set_offline(true);
        let snapshot = store().snapshot();

        // when
        let report = adapter.save(&snapshot).await.unwrap();

        // then
        assert_eq!(report.rows_written, 0);
        assert!(matches!(report.remote, RemoteOutcome::Failed {
            error: BackendError::Unavailable(_),
            ..
        }));
        assert_eq!(adapter.cache().writes(), 1);

        // and
        let outcome = adapter.load().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Local(snapshot));
    }

    #[tokio::test]
    async fn save_stops_at_the_first_failing_entity() {
        // given
        let adapter = adapter();
        adapter
            .remote()
            .reject(EntityRef::Asset(AssetId::from("a1")));
        let snapshot = store().snapshot();

        // when
        let report = adapter.save(&snapshot).await.unwrap();

        // then
        assert_eq!(report.rows_written, 1);
        assert!(matches!(
            report.remote,
            RemoteOutcome::Failed { entity: Some(EntityRef::Asset(ref id)), .. } if id.as_str() == "a1"
        ));
        assert!(adapter
            .remote()
            .rows(Table::Groups)
            .is_empty());
        assert_eq!(adapter.cache().writes(), 1);
    }

    #[tokio::test]
    async fn remote_load_keeps_the_local_session() {
        // given
        let adapter = adapter();
        let mut store = store();
        store.set_active_page(3);
        let snapshot = store.snapshot();
        adapter.save(&snapshot).await.unwrap();

        // when
        let loaded = adapter
            .load()
            .await
            .unwrap();

        // then
        let LoadOutcome::Remote(loaded) = loaded else {
            panic!("expected a remote load, got {:?}", loaded);
        };
        assert_eq!(loaded.projects, snapshot.projects);
        assert_eq!(loaded.assets, snapshot.assets);
        assert_eq!(loaded.groups, snapshot.groups);
        assert_eq!(loaded.active_project_id, snapshot.active_project_id);
        assert_eq!(loaded.active_page_index, 3);
    }

    #[tokio::test]
    async fn removed_memberships_are_pruned() {
        // given
        let adapter = adapter();
        let mut store = store();
        adapter.save(&store.snapshot()).await.unwrap();
        let group_id = store.groups()[0].id.clone();
        store
            .remove_images_from_group(&group_id, &[AssetId::from("a1")])
            .unwrap();

        // when
        adapter.save(&store.snapshot()).await.unwrap();

        // then
        assert!(adapter
            .remote()
            .rows(Table::Memberships)
            .is_empty());
        let loaded = adapter
            .load()
            .await
            .unwrap()
            .into_snapshot()
            .unwrap();
        assert!(loaded.assets[0].group_ids.is_empty());
    }

    #[tokio::test]
    async fn stale_load_is_discarded() {
        // given
        let adapter = adapter();
        adapter.save(&store().snapshot()).await.unwrap();

        // when
        let first = adapter.load();
        let second = adapter.load();

        // then
        assert_eq!(first.await.unwrap(), LoadOutcome::Stale);
        assert!(matches!(second.await.unwrap(), LoadOutcome::Remote(_)));
    }

    #[tokio::test]
    async fn superseded_save_skips_the_local_write() {
        // given
        let adapter = adapter();
        let older = store().snapshot();
        let newer = CalendarStore::new().snapshot();

        // when
        let first = adapter.save(&older);
        let second = adapter.save(&newer);

        // then
        let report = first.await.unwrap();
        assert_eq!(report, SaveReport {
            rows_written: 0,
            remote: RemoteOutcome::Superseded
        });
        assert_eq!(adapter.cache().writes(), 0);

        // and
        second.await.unwrap();
        assert_eq!(adapter.cache().snapshot(), Some(newer));
    }

    #[tokio::test]
    async fn nothing_saved_loads_empty() {
        // expect
        assert_eq!(adapter().load().await.unwrap(), LoadOutcome::Empty);
    }

    #[tokio::test]
    async fn deleting_an_asset_deletes_its_memberships() {
        // given
        let adapter = adapter();
        adapter.save(&store().snapshot()).await.unwrap();

        // when
        let deleted = adapter
            .delete_entity(EntityRef::Asset(AssetId::from("a1")))
            .await
            .unwrap();

        // then
        assert!(deleted);
        assert!(adapter
            .remote()
            .rows(Table::Assets)
            .is_empty());
        assert!(adapter
            .remote()
            .rows(Table::Memberships)
            .is_empty());
    }

    #[test]
    fn config_defaults() {
        // when
        let config: PersistenceConfig = serde_json::from_str("{}").unwrap();

        // then
        assert_eq!(config, PersistenceConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(1000));
    }
}
