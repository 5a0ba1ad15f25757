//! Shared committed state.

use std::{collections::VecDeque, fmt, sync::Arc};

use parking_lot::{Mutex, RwLock};
use sqlauthz_catalog::Catalog;
use tracing::{debug, warn};

use crate::{DatabaseState, StorageError, WriteSet};

/// Commits remembered for conflict checks. A transaction whose snapshot is
/// older than the oldest remembered commit cannot be checked and fails.
const COMMIT_LOG_CAPACITY: usize = 1024;

/// Write sets of recent commits, oldest first.
#[derive(Debug, Default)]
struct CommitLog {
    entries: VecDeque<(u64, WriteSet)>,
    /// Newest version no longer in `entries`
    forgotten: u64,
}

impl CommitLog {
    fn record(&mut self, version: u64, writes: WriteSet) {
        self.entries.push_back((version, writes));
        if self.entries.len() > COMMIT_LOG_CAPACITY {
            if let Some((version, _)) = self.entries.pop_front() {
                self.forgotten = version;
            }
        }
    }

    /// Write sets committed after `version`, or `None` if some of them have
    /// been forgotten.
    fn since(&self, version: u64) -> Option<impl Iterator<Item = &WriteSet>> {
        (version >= self.forgotten)
            .then(|| self.entries.iter().filter(move |(v, _)| *v > version).map(|(_, w)| w))
    }
}

/// Database shared by every session.
///
/// Writers are serialized by `writer`; the published state is swapped under a
/// short write lock so snapshot readers never wait for statement execution.
#[derive(Debug)]
pub struct Database {
    committed: RwLock<Arc<DatabaseState>>,
    writer: Mutex<CommitLog>,
}

impl Database {
    pub fn new(catalog: Catalog) -> Self {
        Database {
            committed: RwLock::new(Arc::new(DatabaseState::new(catalog))),
            writer: Mutex::new(CommitLog::default()),
        }
    }

    /// Latest committed state.
    pub fn snapshot(&self) -> Arc<DatabaseState> {
        Arc::clone(&self.committed.read())
    }

    pub fn version(&self) -> u64 {
        self.committed.read().version()
    }

    /// Apply `f` to a private copy of the latest state and publish it if `f`
    /// succeeds. On error nothing is published.
    pub fn write<T, E>(
        &self,
        f: impl FnOnce(&mut DatabaseState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut log = self.writer.lock();
        let latest = self.snapshot();
        let mut working = DatabaseState::clone(&latest);
        let output = f(&mut working)?;
        let writes = WriteSet::between(&latest, &working);
        self.publish(&mut log, working, writes);
        Ok(output)
    }

    /// Publish a transaction's private state `working`, derived from `base`.
    ///
    /// If nothing was committed since `base` the state is published as is.
    /// Otherwise the transaction fails with a serialization failure when its
    /// writes overlap any commit made since `base`; if they are disjoint,
    /// `replay` re-applies the transaction to a copy of the latest state and
    /// that copy is published instead. A replay that fails is also a
    /// serialization failure.
    pub fn commit<E>(
        &self,
        base: &DatabaseState,
        working: DatabaseState,
        replay: impl FnOnce(&mut DatabaseState) -> Result<(), E>,
    ) -> Result<u64, E>
    where
        E: From<StorageError> + fmt::Display,
    {
        let mut log = self.writer.lock();
        let latest = self.snapshot();
        let writes = WriteSet::between(base, &working);
        if latest.version() == base.version() {
            return Ok(self.publish(&mut log, working, writes));
        }

        let conflict = match log.since(base.version()) {
            None => Some("commit log no longer reaches the transaction's snapshot".to_string()),
            Some(mut concurrent) => {
                concurrent.find_map(|other| writes.overlap(other)).map(|key| format!("{} written concurrently", key))
            }
        };
        let failure = |conflict: String| StorageError::SerializationFailure {
            base_version: base.version(),
            committed_version: latest.version(),
            conflict,
        };
        if let Some(conflict) = conflict {
            warn!(base_version = base.version(), committed_version = latest.version(), %conflict, "serialization failure on commit");
            return Err(failure(conflict).into());
        }

        let mut replayed = DatabaseState::clone(&latest);
        if let Err(err) = replay(&mut replayed) {
            warn!(base_version = base.version(), committed_version = latest.version(), error = %err, "replay failed on commit");
            return Err(failure(format!("replay failed: {}", err)).into());
        }
        debug!(base_version = base.version(), committed_version = latest.version(), writes = writes.len(), "replayed disjoint transaction");
        let writes = WriteSet::between(&latest, &replayed);
        Ok(self.publish(&mut log, replayed, writes))
    }

    fn publish(&self, log: &mut CommitLog, mut state: DatabaseState, writes: WriteSet) -> u64 {
        let version = state.version() + 1;
        state.set_version(version);
        *self.committed.write() = Arc::new(state);
        debug!(version, writes = writes.len(), "published database state");
        log.record(version, writes);
        version
    }
}
