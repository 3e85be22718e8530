use std::sync::Arc;
use std::time::Duration;

use calendar::snapshot::AppStateSnapshot;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::adapter::{PersistenceAdapter, PersistenceError, SaveReport};
use crate::backend::RemoteStore;
use crate::cache::LocalCache;

type FlushResult = Result<Option<SaveReport>, PersistenceError>;

enum Command {
    Save(AppStateSnapshot),
    Flush(oneshot::Sender<FlushResult>),
}

/// Coalesces snapshots scheduled in quick succession into a single save.
///
/// A snapshot is saved once no other snapshot was scheduled for the quiet period, only the latest snapshot is saved.
/// Snapshots still pending when the process dies are lost.
pub struct DebouncedWriter {
    sender: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl DebouncedWriter {
    /// Must be called from within a tokio runtime.
    pub fn spawn<R, C>(adapter: Arc<PersistenceAdapter<R, C>>, quiet: Duration) -> Self
    where
        R: RemoteStore + 'static,
        C: LocalCache + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(adapter, quiet, receiver));

        Self {
            sender,
            task,
        }
    }

    pub fn schedule(&self, snapshot: AppStateSnapshot) -> Result<(), PersistenceError> {
        self.sender
            .send(Command::Save(snapshot))
            .map_err(|_| PersistenceError::WriterClosed)
    }

    /// Save the pending snapshot now, `None` when nothing was pending.
    pub async fn flush(&self) -> FlushResult {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Command::Flush(reply))
            .map_err(|_| PersistenceError::WriterClosed)?;

        response
            .await
            .map_err(|_| PersistenceError::WriterClosed)?
    }

    pub async fn shutdown(self) -> FlushResult {
        let result = self.flush().await;

        let Self {
            sender,
            task,
        } = self;
        drop(sender);
        if let Err(error) = task.await {
            error!("Writer task failed. error: {}", error);
        }

        result
    }
}

async fn run<R: RemoteStore, C: LocalCache>(
    adapter: Arc<PersistenceAdapter<R, C>>,
    quiet: Duration,
    mut receiver: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<AppStateSnapshot> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = receiver.recv() => command,
                _ = tokio::time::sleep(quiet) => {
                    if let Err(error) = write(&adapter, &mut pending).await {
                        error!("Debounced save failed. error: {}", error);
                    }
                    continue;
                }
            }
        } else {
            receiver.recv().await
        };

        match command {
            Some(Command::Save(snapshot)) => {
                if pending.replace(snapshot).is_some() {
                    trace!("Coalesced pending snapshot");
                }
            }
            Some(Command::Flush(reply)) => {
                let result = write(&adapter, &mut pending).await;
                if reply.send(result).is_err() {
                    debug!("Flush requester went away");
                }
            }
            None => {
                if let Err(error) = write(&adapter, &mut pending).await {
                    error!("Final save failed. error: {}", error);
                }
                break;
            }
        }
    }

    debug!("Writer stopped");
}

async fn write<R: RemoteStore, C: LocalCache>(
    adapter: &PersistenceAdapter<R, C>,
    pending: &mut Option<AppStateSnapshot>,
) -> FlushResult {
    let Some(snapshot) = pending.take() else {
        return Ok(None);
    };

    adapter
        .save(&snapshot)
        .await
        .map(Some)
}

#[cfg(test)]
mod tests {
    use calendar::project::{CalendarType, Format, Orientation};
    use calendar::store::CalendarStore;

    use super::*;
    use crate::adapter::RemoteOutcome;
    use crate::cache::MemoryCache;
    use crate::memory::InMemoryRemote;

    const QUIET: Duration = Duration::from_millis(1000);

    fn adapter() -> Arc<PersistenceAdapter<InMemoryRemote, MemoryCache>> {
        Arc::new(PersistenceAdapter::new(InMemoryRemote::new(), MemoryCache::new()))
    }

    fn snapshots(count: usize) -> Vec<AppStateSnapshot> {
        let mut store = CalendarStore::new();
        (0..count)
            .map(|index| {
                store.create_project(format!("Project {}", index), CalendarType::Wall, Format::A4, Orientation::Portrait);
                store.snapshot()
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_schedules_are_coalesced() {
        // given
        let adapter = adapter();
        let writer = DebouncedWriter::spawn(adapter.clone(), QUIET);
        let snapshots = snapshots(3);

        // when
        for snapshot in snapshots.iter().cloned() {
            writer.schedule(snapshot).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        // then
        assert_eq!(adapter.cache().writes(), 0);

        // and when
        tokio::time::sleep(Duration::from_millis(1000)).await;

        // then
        assert_eq!(adapter.cache().writes(), 1);
        assert_eq!(adapter.cache().snapshot().as_ref(), snapshots.last());
        assert_eq!(adapter.remote().rows(crate::rows::Table::Projects).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_saves_immediately() {
        // given
        let adapter = adapter();
        let writer = DebouncedWriter::spawn(adapter.clone(), QUIET);
        writer
            .schedule(snapshots(1).remove(0))
            .unwrap();

        // when
        let report = writer.flush().await.unwrap();

        // then
        assert!(matches!(report, Some(SaveReport { remote: RemoteOutcome::Saved, .. })));
        assert_eq!(adapter.cache().writes(), 1);

        // and
        assert_eq!(writer.flush().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_writes_the_pending_snapshot() {
        // given
        let adapter = adapter();
        let writer = DebouncedWriter::spawn(adapter.clone(), QUIET);
        let snapshot = snapshots(1).remove(0);
        writer.schedule(snapshot.clone()).unwrap();

        // when
        writer.shutdown().await.unwrap();

        // then
        assert_eq!(adapter.cache().snapshot(), Some(snapshot));
    }
}
