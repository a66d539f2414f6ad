//! Embedded database lifecycle and transaction plumbing.
//!
//! The [`Store`] struct wraps a `redb::Database` behind an `Arc` and
//! exposes async helpers that run transactions on the blocking thread
//! pool via `tokio::task::spawn_blocking`.
//!
//! The backing file lives at `<root>/db`. redb holds an exclusive file
//! lock for as long as the database is open, so exactly one process owns
//! the store at a time; [`Store::open`] waits up to a bounded timeout for
//! a previous owner to release the lock instead of hanging.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use redb::{
    Database, DatabaseError, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction,
};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Name of the backing file inside the store root.
const DB_FILE: &str = "db";

/// How long [`Store::open`] waits for another owner to release the
/// exclusive file lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Delay between lock acquisition attempts while opening.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// User records, keyed by 8-byte big-endian identity.
pub(crate) const USERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("users");

/// Event records, keyed by 8-byte big-endian identity.
pub(crate) const EVENTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("events");

/// Ticket records, keyed by the 16-byte (user, event) composite key.
/// Values are empty; the key alone carries the relationship.
pub(crate) const TICKETS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tickets");

/// Identity allocator state: last issued identity per namespace.
pub(crate) const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Thread-safe handle to the embedded database.
///
/// Cloning is cheap (an `Arc` bump); clones share the underlying database
/// and its file lock. All read/write operations go through [`Store::read`]
/// and [`Store::write`], which dispatch onto the blocking thread pool.
#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) a store rooted at `root`.
    ///
    /// Creates the directory if missing, opens the backing file at
    /// `<root>/db`, and ensures all namespaces exist. Waits up to
    /// [`DEFAULT_LOCK_TIMEOUT`] for another owner to release the exclusive
    /// file lock before failing with [`StoreError::LockTimeout`].
    ///
    /// This call blocks briefly (file I/O, plus the lock wait under
    /// contention), so call it during startup before entering the main
    /// async loop, use [`Store::open_async`], or wrap it in
    /// `spawn_blocking` yourself.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with_timeout(root, DEFAULT_LOCK_TIMEOUT)
    }

    /// Open (or create) a store, waiting at most `lock_timeout` for
    /// another owner to release the exclusive file lock.
    pub fn open_with_timeout(
        root: impl Into<PathBuf>,
        lock_timeout: Duration,
    ) -> StoreResult<Self> {
        let root = root.into();
        info!(root = %root.display(), "opening store");

        std::fs::create_dir_all(&root)?;

        let db = Self::acquire(&root.join(DB_FILE), &root, lock_timeout)?;

        // Ensure every namespace exists up front so read transactions never
        // observe a missing table. Opening an existing table is a no-op.
        let txn = db.begin_write()?;
        txn.open_table(USERS)?;
        txn.open_table(EVENTS)?;
        txn.open_table(TICKETS)?;
        txn.open_table(SEQUENCES)?;
        txn.commit()?;

        debug!(root = %root.display(), "store open, namespaces ready");
        Ok(Self {
            root,
            db: Arc::new(db),
        })
    }

    /// Async counterpart of [`Store::open`]; runs the blocking open on the
    /// blocking thread pool.
    pub async fn open_async(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        tokio::task::spawn_blocking(move || Self::open(root)).await?
    }

    /// Retry `Database::create` until the exclusive file lock is acquired
    /// or `timeout` elapses.
    fn acquire(file: &Path, root: &Path, timeout: Duration) -> StoreResult<Database> {
        let started = Instant::now();
        loop {
            match Database::create(file) {
                Ok(db) => return Ok(db),
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    if started.elapsed() >= timeout {
                        return Err(StoreError::LockTimeout {
                            path: root.to_path_buf(),
                            waited_ms: started.elapsed().as_millis() as u64,
                        });
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Return the root path the store was opened with.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Close this handle.
    ///
    /// Committed data is already durable, so closing cannot fail; the
    /// exclusive file lock is released once the last clone of this handle
    /// is dropped. Dropping the handle without calling `close` is
    /// equivalent.
    pub fn close(self) {
        info!(root = %self.root.display(), "closing store");
        drop(self);
    }

    /// Run a read-only transaction on the blocking thread pool.
    ///
    /// The closure observes a consistent snapshot of the store as of
    /// transaction start; it never blocks writers and is never blocked by
    /// them.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count = store
    ///     .read(|txn| {
    ///         let table = txn.open_table(USERS)?;
    ///         Ok(table.len()?)
    ///     })
    ///     .await?;
    /// ```
    pub async fn read<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&ReadTransaction) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read()?;
            f(&txn)
        })
        .await?
    }

    /// Run a read-write transaction on the blocking thread pool.
    ///
    /// Write transactions are serialized with respect to each other by the
    /// engine; concurrent snapshot readers proceed unblocked. The
    /// transaction commits only if the closure returns `Ok`. On any error
    /// path it is dropped, which rolls it back, so partial effects are
    /// never visible.
    pub async fn write<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&WriteTransaction) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write()?;
            let value = f(&txn)?;
            txn.commit()?;
            Ok(value)
        })
        .await?
    }
}

// ── identity allocator ───────────────────────────────────────────────

/// Allocate the next identity for `namespace` inside the caller's write
/// transaction.
///
/// Identities start at 1 and increase monotonically. The counter bump
/// commits (or rolls back) together with the caller's insert, so a failed
/// transaction never burns an identity and the same number is never
/// issued twice, even across process restarts.
pub(crate) fn next_id(txn: &WriteTransaction, namespace: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = match table.get(namespace)? {
        Some(last) => last.value() + 1,
        None => 1,
    };
    table.insert(namespace, next)?;
    Ok(next)
}

// ── tests ────────────────────────────────────────────────────────────
