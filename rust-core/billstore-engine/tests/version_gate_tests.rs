// SPDX-License-Identifier: PMPL-1.0-or-later
//! Startup version gate against real backends.

use async_trait::async_trait;
use billstore_engine::keys;
use billstore_engine::versions::{self, current_versions};
use billstore_engine::{check_versions, BackendClass, DataStore, StorageKind, VersionError, Versions};
use billstore_storage::{InMemoryBackend, StorageBackend, StorageError, TypedStore};

/// Accepts reads, rejects every write.
#[derive(Debug, Clone, Default)]
struct ReadOnlyBackend {
    inner: InMemoryBackend,
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &[u8], _value: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::BackendUnavailable("read-only".into()))
    }

    async fn delete(&self, _key: &[u8]) -> Result<bool, StorageError> {
        Err(StorageError::BackendUnavailable("read-only".into()))
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        self.inner.scan_prefix(prefix, limit).await
    }

    async fn batch_put(&self, _entries: &[(&[u8], &[u8])]) -> Result<(), StorageError> {
        Err(StorageError::BackendUnavailable("read-only".into()))
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        Err(StorageError::BackendUnavailable("read-only".into()))
    }

    async fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "read-only"
    }
}

#[tokio::test]
async fn empty_store_gets_stamped_and_starts() {
    let store = DataStore::new(InMemoryBackend::new());
    let class = StorageKind::Redis.class();

    check_versions(&store, class).await.unwrap();

    let stamp = store.get_versions().await.unwrap();
    assert_eq!(stamp, current_versions(class));

    // Second start sees the stamp and proceeds.
    check_versions(&store, class).await.unwrap();
}

#[tokio::test]
async fn data_without_stamp_requires_migration() {
    let backend = InMemoryBackend::new();
    TypedStore::new(backend.clone(), keys::LEGACY_NAMESPACE)
        .put(&keys::account("*OUT:CUSTOMER_1:rif"), &serde_json::json!({}))
        .await
        .unwrap();

    let store = DataStore::new(backend);
    let err = check_versions(&store, BackendClass::Combined).await.unwrap_err();
    assert!(matches!(err, VersionError::MigrationRequired));
    assert!(err.to_string().contains("billstore-migrator"));
    assert!(store.get_versions().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn stale_stamp_names_the_remediation() {
    let store = DataStore::new(InMemoryBackend::new());
    let mut stamp = current_versions(BackendClass::Keyed);
    stamp.set(versions::STATS, 1);
    stamp.set(versions::THRESHOLDS, 1);
    store.set_versions(&stamp, true).await.unwrap();

    match check_versions(&store, BackendClass::Keyed).await {
        Err(VersionError::Stale { remediation }) => {
            assert_eq!(remediation, "billstore-migrator -migrate=*stats");
        }
        other => panic!("expected stale error, got {other:?}"),
    }

    // Only the detail family matters for a detail store.
    check_versions(&store, BackendClass::Detail)
        .await
        .expect_err("cost details were never stamped");
}

#[tokio::test]
async fn stamp_write_failure_does_not_block_startup() {
    let store = DataStore::new(ReadOnlyBackend::default());
    check_versions(&store, BackendClass::Keyed).await.unwrap();
    assert!(store.get_versions().await.is_err());
}

#[tokio::test]
async fn set_db_versions_merges_into_existing_stamp() {
    let store = DataStore::new(InMemoryBackend::new());
    let partial: Versions = [("Custom", 7i64)].into_iter().collect();
    store.set_versions(&partial, true).await.unwrap();

    versions::set_db_versions(&store, BackendClass::Detail).await;

    let stamp = store.get_versions().await.unwrap();
    assert_eq!(stamp.get("Custom"), 7);
    assert_eq!(stamp.get(versions::COST_DETAILS), 2);
}
