use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::trace;
use util::sorting::SortOrder;

use crate::backend::{BackendError, RemoteStore};
use crate::rows::{EntityRef, Row, Table};

/// A remote store held in memory, with failure injection for exercising the fallback paths.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    tables: Mutex<BTreeMap<Table, Vec<Row>>>,
    offline: AtomicBool,
    rejected: Mutex<HashSet<EntityRef>>,
    upserts: AtomicUsize,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Writes of the entity fail with [`BackendError::Rejected`].
    pub fn reject(&self, entity: EntityRef) {
        self.rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity);
    }

    /// The number of successful upserts.
    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_online(&self) -> Result<(), BackendError> {
        match self.offline.load(Ordering::SeqCst) {
            true => Err(BackendError::Unavailable("offline".to_string())),
            false => Ok(()),
        }
    }

    fn upsert_row(&self, row: Row) -> Result<(), BackendError> {
        self.check_online()?;

        let entity = EntityRef::from(&row);
        if self
            .rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&entity)
        {
            return Err(BackendError::Rejected {
                entity,
                reason: "rejected by test".to_string(),
            });
        }

        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(row.table()).or_default();
        let key = row.key();
        match rows
            .iter_mut()
            .find(|existing| existing.key() == key)
        {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);

        trace!("Upserted row. entity: {}", entity);
        Ok(())
    }

    fn scan_rows(&self, table: Table) -> Result<Vec<Row>, BackendError> {
        self.check_online()?;

        let mut rows = self.rows(table);
        SortOrder::Desc.sort_by_key(&mut rows, Row::created_at);
        Ok(rows)
    }

    fn delete_row(&self, entity: EntityRef) -> Result<bool, BackendError> {
        self.check_online()?;

        let mut tables = self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(rows) = tables.get_mut(&entity.table()) else {
            return Ok(false);
        };

        let key = entity.key();
        let before = rows.len();
        rows.retain(|row| row.key() != key);
        Ok(rows.len() != before)
    }
}

impl RemoteStore for InMemoryRemote {
    fn upsert(&self, row: Row) -> BoxFuture<'_, Result<(), BackendError>> {
        async move { self.upsert_row(row) }.boxed()
    }

    fn scan(&self, table: Table) -> BoxFuture<'_, Result<Vec<Row>, BackendError>> {
        async move { self.scan_rows(table) }.boxed()
    }

    fn delete(&self, entity: EntityRef) -> BoxFuture<'_, Result<bool, BackendError>> {
        async move { self.delete_row(entity) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use calendar::ids::GroupId;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::rows::GroupRow;

    fn group_row(id: &str, age_days: i64) -> Row {
        Row::Group(GroupRow {
            id: GroupId::from(id),
            name: id.to_string(),
            color: None,
            image_ids: vec![],
            created_at: Utc::now() - Duration::days(age_days),
        })
    }

    #[tokio::test]
    async fn upsert_replaces_by_key_and_scan_is_newest_first() {
        // given
        let remote = InMemoryRemote::new();
        remote.upsert(group_row("old", 10)).await.unwrap();
        remote.upsert(group_row("new", 1)).await.unwrap();

        // when
        remote.upsert(group_row("old", 5)).await.unwrap();
        let rows = remote.scan(Table::Groups).await.unwrap();

        // then
        let keys = rows
            .iter()
            .map(Row::key)
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["new", "old"]);
        assert_eq!(remote.upserts(), 3);
    }

    #[tokio::test]
    async fn offline_remote_fails_every_call() {
        // given
        let remote = InMemoryRemote::new();
        remote.set_offline(true);

        // expect
        assert!(matches!(
            remote.upsert(group_row("g1", 0)).await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(remote.scan(Table::Groups).await.is_err());
        assert!(remote
            .delete(EntityRef::Group("g1".into()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        // given
        let remote = InMemoryRemote::new();
        remote.upsert(group_row("g1", 0)).await.unwrap();

        // expect
        assert_eq!(remote.delete(EntityRef::Group("g1".into())).await, Ok(true));
        assert_eq!(remote.delete(EntityRef::Group("g1".into())).await, Ok(false));
    }
}
