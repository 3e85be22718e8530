use futures::future::BoxFuture;
use thiserror::Error;

use crate::rows::{EntityRef, Row, Table};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unavailable. reason: {0}")]
    Unavailable(String),
    #[error("Write rejected. entity: {entity}, reason: {reason}")]
    Rejected { entity: EntityRef, reason: String },
    #[error("IO error. table: {table}, reason: {reason}")]
    Io { table: Table, reason: String },
    #[error("Invalid row data. table: {table}, reason: {reason}")]
    InvalidRow { table: Table, reason: String },
}

/// Row level CRUD against the remote backend.
///
/// Writes are upserts by primary key.  Scans return every row of a table, newest `created_at` first.  Deletes
/// remove a single row, there are no cascades.
pub trait RemoteStore: Send + Sync {
    fn upsert(&self, row: Row) -> BoxFuture<'_, Result<(), BackendError>>;

    fn scan(&self, table: Table) -> BoxFuture<'_, Result<Vec<Row>, BackendError>>;

    /// Returns `false` when there was no such row.
    fn delete(&self, entity: EntityRef) -> BoxFuture<'_, Result<bool, BackendError>>;
}
