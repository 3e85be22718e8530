use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use util::sorting::SortOrder;

use crate::backend::{BackendError, RemoteStore};
use crate::rows::{EntityRef, Row, Table};

/// A remote store backed by a directory, one pretty printed JSON array per table.
///
/// Writes are read-modify-write of the table file, serialized by a lock so that writes from this process do not
/// interleave.
#[derive(Debug)]
pub struct DirectoryRemote {
    root: PathBuf,
    lock: Mutex<()>,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, table: Table) -> PathBuf {
        let mut path = self.root.clone();
        path.push(format!("{}.json", table.name()));
        path
    }

    async fn read_table(&self, table: Table) -> Result<Vec<Row>, BackendError> {
        let path = self.table_path(table);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(error) => return Err(io_error(table, error)),
        };

        let values: Vec<serde_json::Value> =
            serde_json::from_slice(&content).map_err(|error| BackendError::InvalidRow {
                table,
                reason: error.to_string(),
            })?;

        values
            .into_iter()
            .map(|value| {
                Row::from_value(table, value).map_err(|error| BackendError::InvalidRow {
                    table,
                    reason: error.to_string(),
                })
            })
            .collect()
    }

    async fn write_table(&self, table: Table, rows: &[Row]) -> Result<(), BackendError> {
        let values = rows
            .iter()
            .map(Row::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| BackendError::InvalidRow {
                table,
                reason: error.to_string(),
            })?;

        let content = to_pretty_json(&values).map_err(|error| BackendError::InvalidRow {
            table,
            reason: error.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|error| io_error(table, error))?;
        tokio::fs::write(self.table_path(table), content)
            .await
            .map_err(|error| io_error(table, error))?;

        trace!("Wrote table. table: {}, rows: {}", table, rows.len());
        Ok(())
    }

    async fn upsert_row(&self, row: Row) -> Result<(), BackendError> {
        let _guard = self.lock.lock().await;

        let table = row.table();
        let mut rows = self.read_table(table).await?;
        let key = row.key();
        match rows
            .iter_mut()
            .find(|existing| existing.key() == key)
        {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }

        self.write_table(table, &rows).await
    }

    async fn scan_rows(&self, table: Table) -> Result<Vec<Row>, BackendError> {
        let mut rows = self.read_table(table).await?;
        SortOrder::Desc.sort_by_key(&mut rows, Row::created_at);

        debug!("Scanned table. table: {}, rows: {}", table, rows.len());
        Ok(rows)
    }

    async fn delete_row(&self, entity: EntityRef) -> Result<bool, BackendError> {
        let _guard = self.lock.lock().await;

        let table = entity.table();
        let mut rows = self.read_table(table).await?;
        let key = entity.key();
        let before = rows.len();
        rows.retain(|row| row.key() != key);
        if rows.len() == before {
            return Ok(false);
        }

        self.write_table(table, &rows).await?;
        Ok(true)
    }
}

/// Four space indented JSON with a trailing newline, the format of every file written by the stores.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut content = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut content, formatter);
    value.serialize(&mut ser)?;

    content.push(b'\n');
    Ok(content)
}

fn io_error(table: Table, error: std::io::Error) -> BackendError {
    BackendError::Io {
        table,
        reason: error.to_string(),
    }
}

impl RemoteStore for DirectoryRemote {
    fn upsert(&self, row: Row) -> BoxFuture<'_, Result<(), BackendError>> {
        self.upsert_row(row).boxed()
    }

    fn scan(&self, table: Table) -> BoxFuture<'_, Result<Vec<Row>, BackendError>> {
        self.scan_rows(table).boxed()
    }

    fn delete(&self, entity: EntityRef) -> BoxFuture<'_, Result<bool, BackendError>> {
        self.delete_row(entity).boxed()
    }
}

#[cfg(test)]
mod tests {
    use calendar::ids::{AssetId, GroupId};
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;
    use crate::rows::MembershipRow;

    fn membership(asset: &str, group: &str) -> Row {
        Row::Membership(MembershipRow {
            asset_id: AssetId::from(asset),
            group_id: GroupId::from(group),
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn rows_are_persisted_per_table() {
        // given
        let temp_dir = tempdir().unwrap();
        let remote = DirectoryRemote::new(temp_dir.path().join("store"));

        // when
        remote.upsert(membership("a1", "g1")).await.unwrap();
        remote.upsert(membership("a2", "g1")).await.unwrap();
        remote.upsert(membership("a1", "g1")).await.unwrap();

        // then
        assert!(remote.table_path(Table::Memberships).exists());
        let reopened = DirectoryRemote::new(temp_dir.path().join("store"));
        let rows = reopened.scan(Table::Memberships).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(reopened.scan(Table::Projects).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_a_single_row() {
        // given
        let temp_dir = tempdir().unwrap();
        let remote = DirectoryRemote::new(temp_dir.path());
        remote.upsert(membership("a1", "g1")).await.unwrap();
        remote.upsert(membership("a1", "g2")).await.unwrap();

        // when
        let deleted = remote
            .delete(EntityRef::Membership {
                asset_id: "a1".into(),
                group_id: "g2".into(),
            })
            .await
            .unwrap();

        // then
        assert!(deleted);
        let rows = remote.scan(Table::Memberships).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key(), "a1:g1");
    }

    #[tokio::test]
    async fn corrupt_table_is_reported() {
        // given
        let temp_dir = tempdir().unwrap();
        let remote = DirectoryRemote::new(temp_dir.path());
        std::fs::write(remote.table_path(Table::Groups), "{ not json").unwrap();

        // when
        let result = remote.scan(Table::Groups).await;

        // then
        assert!(matches!(result, Err(BackendError::InvalidRow { table: Table::Groups, .. })));
    }
}
