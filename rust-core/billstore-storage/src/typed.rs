// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed storage wrapper for BillStore.
//
// Provides a serde-based interface on top of any `StorageBackend`. Values are
// serialized as JSON and all keys are prefixed with a namespace, which is how
// the legacy (`v1`) records and the current (`data`) records share a single
// physical backend while still being addressed by the same family keys.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// A typed wrapper around a [`StorageBackend`] that handles serialization
/// and namespace prefixing automatically.
///
/// Keys are prefixed with `"{namespace}:"` before being passed to the
/// underlying backend.
///
/// # Example
///
/// ```rust
/// use billstore_storage::memory::InMemoryBackend;
/// use billstore_storage::typed::TypedStore;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Serialize, Deserialize, PartialEq)]
/// struct SharedGroup { id: String, members: Vec<String> }
///
/// # tokio_test::block_on(async {
/// let store = TypedStore::new(InMemoryBackend::new(), "data");
///
/// let group = SharedGroup { id: "SG1".into(), members: vec!["1001".into()] };
/// store.put("shg_SG1", &group).await.unwrap();
///
/// let retrieved: SharedGroup = store.get("shg_SG1").await.unwrap().unwrap();
/// assert_eq!(retrieved, group);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TypedStore<B: StorageBackend> {
    backend: B,
    namespace: String,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store wrapping `backend` with the given namespace.
    pub fn new(backend: B, namespace: &str) -> Self {
        Self {
            backend,
            namespace: namespace.to_string(),
        }
    }

    /// Return a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Return the namespace prefix used by this store.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn prefixed_key(&self, key: &str) -> Vec<u8> {
        format!("{}:{}", self.namespace, key).into_bytes()
    }

    fn logical_key(&self, raw_key: &[u8]) -> String {
        let ns_prefix_len = self.namespace.len() + 1;
        if raw_key.len() >= ns_prefix_len {
            String::from_utf8_lossy(&raw_key[ns_prefix_len..]).to_string()
        } else {
            String::from_utf8_lossy(raw_key).to_string()
        }
    }

    fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(value).map_err(|err| {
            StorageError::SerializationError(format!(
                "failed to serialize value for key '{}': {}",
                key, err
            ))
        })
    }

    /// Retrieve and deserialize a value by its logical key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let full_key = self.prefixed_key(key);
        match self.backend.get(&full_key).await? {
            Some(bytes) => {
                let value: T = serde_json::from_slice(&bytes).map_err(|err| {
                    StorageError::SerializationError(format!(
                        "failed to deserialize value for key '{}': {}",
                        key, err
                    ))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Stored bytes under the given logical key, without decoding them.
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.backend.get(&self.prefixed_key(key)).await
    }

    /// Serialize and store a value under the given logical key.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let full_key = self.prefixed_key(key);
        let bytes = Self::encode(key, value)?;
        self.backend.put(&full_key, &bytes).await
    }

    /// Serialize and store several values in one atomic backend batch.
    ///
    /// Values are passed pre-converted to `serde_json::Value` so records of
    /// different types can share a batch.
    pub async fn put_many(&self, entries: &[(String, serde_json::Value)]) -> Result<(), StorageError> {
        let mut owned = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            owned.push((self.prefixed_key(key), Self::encode(key, value)?));
        }
        let borrowed: Vec<(&[u8], &[u8])> = owned
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        self.backend.batch_put(&borrowed).await
    }

    /// Delete a value by its logical key.
    ///
    /// Returns `Ok(true)` if the key existed and was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let full_key = self.prefixed_key(key);
        self.backend.delete(&full_key).await
    }

    /// True if a value is stored under the logical key.
    pub async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        self.backend.exists(&self.prefixed_key(key)).await
    }

    /// List every logical key in this namespace that starts with `key_prefix`,
    /// in lexicographic order.
    pub async fn keys(&self, key_prefix: &str) -> Result<Vec<String>, StorageError> {
        let full_prefix = self.prefixed_key(key_prefix);
        let raw = self.backend.scan_prefix(&full_prefix, usize::MAX).await?;
        Ok(raw.iter().map(|(k, _)| self.logical_key(k)).collect())
    }

    /// Scan all entries in this namespace whose keys (after the namespace
    /// prefix) start with the given `key_prefix`, returning up to `limit`
    /// deserialized (key-suffix, value) pairs.
    pub async fn scan_prefix<T: DeserializeOwned>(
        &self,
        key_prefix: &str,
        limit: usize,
    ) -> Result<Vec<(String, T)>, StorageError> {
        let full_prefix = self.prefixed_key(key_prefix);
        let raw_results = self.backend.scan_prefix(&full_prefix, limit).await?;

        let mut results = Vec::with_capacity(raw_results.len());
        for (raw_key, raw_value) in raw_results {
            let logical_key = self.logical_key(&raw_key);
            let value: T = serde_json::from_slice(&raw_value).map_err(|err| {
                StorageError::SerializationError(format!(
                    "failed to deserialize scanned value for key '{}': {}",
                    logical_key, err
                ))
            })?;
            results.push((logical_key, value));
        }

        Ok(results)
    }
}
