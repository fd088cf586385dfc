// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//
// redb-backed persistent storage backend for BillStore.
//
// One redb file holds one table; legacy and current records are told apart by
// their namespace prefix, not by table. Every operation runs its redb
// transaction on the blocking pool so async callers never stall the runtime.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table,
    TableDefinition,
};
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Keys and values are opaque byte slices, matching `StorageBackend`.
const MAIN_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("billstore");

type ByteTable<'txn> = Table<'txn, &'static [u8], &'static [u8]>;
type ByteReadTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

fn unavailable<E: Display>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::BackendUnavailable(format!("{context}: {e}"))
}

fn corrupted<E: Display>(context: &'static str) -> impl Fn(E) -> StorageError {
    move |e| StorageError::CorruptedData(format!("{context}: {e}"))
}

/// Run `body` against the main table inside a read transaction.
///
/// A missing table means nothing was ever written, so `empty` is returned.
fn with_read_table<T>(
    db: &Database,
    empty: T,
    body: impl FnOnce(&ByteReadTable) -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let txn = db.begin_read().map_err(unavailable("read txn"))?;
    match txn.open_table(MAIN_TABLE) {
        Ok(table) => body(&table),
        Err(_) => Ok(empty),
    }
}

/// Run `body` against the main table inside a committed write transaction.
fn with_write_table<T>(
    db: &Database,
    body: impl FnOnce(&mut ByteTable<'_>) -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let txn = db.begin_write().map_err(unavailable("write txn"))?;
    let out = {
        let mut table = txn.open_table(MAIN_TABLE).map_err(unavailable("open table"))?;
        body(&mut table)?
    };
    txn.commit().map_err(corrupted("commit"))?;
    Ok(out)
}

/// A persistent storage backend powered by redb.
///
/// This is the `redb` storage kind, which serves the keyed (data-only) role.
///
/// # Example
///
/// ```rust,no_run
/// use billstore_storage::redb_backend::RedbBackend;
/// use billstore_storage::backend::StorageBackend;
///
/// # tokio_test::block_on(async {
/// let store = RedbBackend::open("/var/lib/billstore/data.redb").unwrap();
/// store.put(b"data:acc_1001", b"{}").await.unwrap();
/// # });
/// ```
///
/// Clones share the same open database.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbBackend {
    /// Open or create a redb database at the given path.
    ///
    /// Creates parent directories if they don't exist. The table is created
    /// on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let db = Database::create(&path).map_err(|e| {
            StorageError::BackendUnavailable(format!(
                "failed to open redb at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "opened redb store");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(unavailable("task join"))?
    }
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| {
            with_read_table(db, None, |table| {
                let found = table.get(key.as_slice()).map_err(corrupted("get"))?;
                Ok(found.map(|value| value.value().to_vec()))
            })
        })
        .await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let key = key.to_vec();
        let value = value.to_vec();
        self.blocking(move |db| {
            with_write_table(db, |table| {
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(corrupted("insert"))?;
                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        let key = key.to_vec();
        self.blocking(move |db| {
            with_write_table(db, |table| {
                let removed = table.remove(key.as_slice()).map_err(corrupted("remove"))?;
                Ok(removed.is_some())
            })
        })
        .await
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let prefix = prefix.to_vec();
        self.blocking(move |db| {
            with_read_table(db, Vec::new(), |table| {
                let mut results = Vec::new();
                let iter = table
                    .range(prefix.as_slice()..)
                    .map_err(corrupted("range scan"))?;
                for entry in iter {
                    if results.len() >= limit {
                        break;
                    }
                    let (k, v) = entry.map_err(corrupted("scan entry"))?;
                    let k = k.value().to_vec();
                    if !k.starts_with(&prefix) {
                        break;
                    }
                    results.push((k, v.value().to_vec()));
                }
                Ok(results)
            })
        })
        .await
    }

    async fn batch_put(&self, entries: &[(&[u8], &[u8])]) -> Result<(), StorageError> {
        let owned: Vec<(Vec<u8>, Vec<u8>)> = entries
            .iter()
            .map(|(k, v)| (k.to_vec(), v.to_vec()))
            .collect();
        self.blocking(move |db| {
            with_write_table(db, |table| {
                for (k, v) in &owned {
                    table
                        .insert(k.as_slice(), v.as_slice())
                        .map_err(corrupted("batch insert"))?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        self.blocking(|db| {
            with_write_table(db, |table| {
                let removed = table.len().map_err(corrupted("len"))?;
                table.retain(|_, _| false).map_err(corrupted("retain"))?;
                Ok(removed)
            })
        })
        .await
    }

    async fn flush(&self) -> Result<(), StorageError> {
        // Each write transaction is fsynced on commit.
        Ok(())
    }

    fn name(&self) -> &str {
        "redb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// The tempdir must outlive the backend; redb keeps the file open.
    fn temp_backend() -> (RedbBackend, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");
        let backend = RedbBackend::open(&path).unwrap();
        (backend, dir)
    }

    #[tokio::test]
    async fn test_basic_crud() {
        let (backend, _dir) = temp_backend();

        assert_eq!(backend.get(b"data:acc_1").await.unwrap(), None);

        backend.put(b"data:acc_1", b"v1").await.unwrap();
        assert_eq!(backend.get(b"data:acc_1").await.unwrap(), Some(b"v1".to_vec()));

        backend.put(b"data:acc_1", b"v2").await.unwrap();
        assert_eq!(backend.get(b"data:acc_1").await.unwrap(), Some(b"v2".to_vec()));

        assert!(backend.delete(b"data:acc_1").await.unwrap());
        assert_eq!(backend.get(b"data:acc_1").await.unwrap(), None);
        assert!(!backend.delete(b"data:acc_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let (backend, _dir) = temp_backend();

        backend.put(b"v1:acc_1001", b"a").await.unwrap();
        backend.put(b"v1:acc_1002", b"b").await.unwrap();
        backend.put(b"v1:apl_P", b"c").await.unwrap();
        backend.put(b"data:acc_1001", b"d").await.unwrap();

        let results = backend.scan_prefix(b"v1:acc_", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, b"v1:acc_1001".to_vec());
        assert_eq!(results[1].0, b"v1:acc_1002".to_vec());

        let results = backend.scan_prefix(b"v1:", 2).await.unwrap();
        assert_eq!(results.len(), 2);

        assert!(backend.scan_prefix(b"v1:cst_", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_put_and_clear() {
        let (backend, _dir) = temp_backend();

        backend
            .batch_put(&[
                (b"data:ftr_t:1" as &[u8], b"f" as &[u8]),
                (b"data:sqp_t:1", b"p"),
                (b"data:stq_t:1", b"q"),
            ])
            .await
            .unwrap();

        assert_eq!(backend.get(b"data:stq_t:1").await.unwrap(), Some(b"q".to_vec()));
        assert_eq!(backend.clear().await.unwrap(), 3);
        assert!(backend.scan_prefix(b"", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_on_fresh_file() {
        let (backend, _dir) = temp_backend();
        assert!(backend.scan_prefix(b"v1:", 10).await.unwrap().is_empty());
        assert_eq!(backend.clear().await.unwrap(), 0);
        assert_eq!(backend.name(), "redb");
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist-test.redb");

        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put(b"data:versions", b"{}").await.unwrap();
            backend.flush().await.unwrap();
        }

        {
            let backend = RedbBackend::open(&path).unwrap();
            let val = backend.get(b"data:versions").await.unwrap();
            assert_eq!(val, Some(b"{}".to_vec()));
            assert_eq!(backend.path(), path.as_path());
        }
    }
}
