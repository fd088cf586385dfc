// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessor for current-shape records.

use billstore_storage::{StorageBackend, StorageError, TypedStore};
use tracing::debug;

use crate::error::EngineError;
use crate::keys;
use crate::model::{
    Account, Action, ActionPlan, ActionTrigger, Entity, Filter, SharedGroup, StatQueue,
    StatQueueProfile,
};
use crate::versions::Versions;

/// The live store: current records plus the version stamp, kept under the
/// `data` namespace of a shared backend.
#[derive(Debug, Clone)]
pub struct DataStore<B: StorageBackend> {
    typed: TypedStore<B>,
}

impl<B: StorageBackend> DataStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            typed: TypedStore::new(backend, keys::DATA_NAMESPACE),
        }
    }

    pub fn backend(&self) -> &B {
        self.typed.backend()
    }

    pub fn typed(&self) -> &TypedStore<B> {
        &self.typed
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, StorageError> {
        self.typed.get(&keys::account(id)).await
    }

    pub async fn get_action_plan(&self, id: &str) -> Result<Option<ActionPlan>, StorageError> {
        self.typed.get(&keys::action_plan(id)).await
    }

    pub async fn get_action_triggers(
        &self,
        id: &str,
    ) -> Result<Option<Vec<ActionTrigger>>, StorageError> {
        self.typed.get(&keys::action_triggers(id)).await
    }

    pub async fn get_actions(&self, id: &str) -> Result<Option<Vec<Action>>, StorageError> {
        self.typed.get(&keys::actions(id)).await
    }

    pub async fn get_shared_group(&self, id: &str) -> Result<Option<SharedGroup>, StorageError> {
        self.typed.get(&keys::shared_group(id)).await
    }

    pub async fn get_filter(&self, tenant: &str, id: &str) -> Result<Option<Filter>, StorageError> {
        self.typed.get(&keys::filter(tenant, id)).await
    }

    pub async fn get_stat_queue_profile(
        &self,
        tenant: &str,
        id: &str,
    ) -> Result<Option<StatQueueProfile>, StorageError> {
        self.typed.get(&keys::stat_queue_profile(tenant, id)).await
    }

    pub async fn get_stat_queue(
        &self,
        tenant: &str,
        id: &str,
    ) -> Result<Option<StatQueue>, StorageError> {
        self.typed.get(&keys::stat_queue(tenant, id)).await
    }

    pub async fn set_entity(&self, entity: &Entity) -> Result<(), EngineError> {
        self.typed.put(&entity.key(), &entity.to_value()?).await?;
        Ok(())
    }

    /// Write several entities in one atomic batch.
    pub async fn set_entities(&self, entities: &[Entity]) -> Result<(), EngineError> {
        let mut batch = Vec::with_capacity(entities.len());
        for entity in entities {
            batch.push((entity.key(), entity.to_value()?));
        }
        self.typed.put_many(&batch).await?;
        debug!(count = batch.len(), "wrote current records");
        Ok(())
    }

    /// Read the version stamp. A missing stamp is [`StorageError::NotFound`].
    pub async fn get_versions(&self) -> Result<Versions, StorageError> {
        self.typed
            .get(keys::VERSIONS_KEY)
            .await?
            .ok_or_else(|| StorageError::NotFound(keys::VERSIONS_KEY.to_string()))
    }

    /// Write the version stamp. With `overwrite` the stored map is replaced,
    /// otherwise `versions` is merged into it.
    pub async fn set_versions(&self, versions: &Versions, overwrite: bool) -> Result<(), StorageError> {
        let merged = if overwrite {
            versions.clone()
        } else {
            let mut stored = match self.get_versions().await {
                Ok(stored) => stored,
                Err(err) if err.is_not_found() => Versions::new(),
                Err(err) => return Err(err),
            };
            stored.merge(versions);
            stored
        };
        self.typed.put(keys::VERSIONS_KEY, &merged).await
    }

    pub async fn remove_versions(&self) -> Result<bool, StorageError> {
        self.typed.delete(keys::VERSIONS_KEY).await
    }

    /// True when the backend holds no record at all, in any namespace.
    pub async fn is_db_empty(&self) -> Result<bool, StorageError> {
        Ok(self.backend().scan_prefix(b"", 1).await?.is_empty())
    }

    /// Erase the whole backend. Operator and test use only.
    pub async fn flush_all(&self) -> Result<u64, StorageError> {
        self.backend().clear().await
    }
}
