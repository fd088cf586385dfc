// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core storage backend trait for BillStore.
//
// Defines the `StorageBackend` trait that every storage engine must satisfy.
// The interface is deliberately small: point reads and writes, prefix
// scanning (used to enumerate an entity family by its key prefix), atomic
// batch writes (used when one legacy record fans out into several current
// entities) and a full erase for operator flushes.

use async_trait::async_trait;

use crate::error::StorageError;

/// A pluggable key-value storage backend.
///
/// All keys and values are opaque byte slices. Higher-level typed access
/// is provided by [`crate::typed::TypedStore`], which wraps a backend with
/// serde-based serialization and namespace prefixing.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieve the value associated with `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist, rather than an error.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any previous value for `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete the value associated with `key`.
    ///
    /// Returns `Ok(true)` if the key existed and was removed, `Ok(false)` if
    /// the key was not present.
    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError>;

    /// Check whether `key` exists without handing back its value.
    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Scan all keys that start with `prefix`, returning up to `limit`
    /// (key, value) pairs in lexicographic order.
    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError>;

    /// Write multiple key-value pairs atomically.
    ///
    /// Either all entries are written or none are.
    async fn batch_put(&self, entries: &[(&[u8], &[u8])]) -> Result<(), StorageError>;

    /// Erase every key in the backend, returning how many were removed.
    ///
    /// Operator and test use only; the migrator never calls this.
    async fn clear(&self) -> Result<u64, StorageError>;

    /// Flush any buffered writes to durable storage.
    ///
    /// For in-memory backends this is a no-op.
    async fn flush(&self) -> Result<(), StorageError>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<B: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<B> {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        (**self).delete(key).await
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        (**self).exists(key).await
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        (**self).scan_prefix(prefix, limit).await
    }

    async fn batch_put(&self, entries: &[(&[u8], &[u8])]) -> Result<(), StorageError> {
        (**self).batch_put(entries).await
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        (**self).clear().await
    }

    async fn flush(&self) -> Result<(), StorageError> {
        (**self).flush().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
