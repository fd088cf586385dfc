// SPDX-License-Identifier: PMPL-1.0-or-later
//! Reader over legacy records.

use billstore_engine::{keys, Family};
use billstore_storage::{StorageBackend, StorageError, TypedStore};

use super::model::{V1Account, V1Action, V1ActionPlan, V1ActionTrigger, V1SharedGroup, V1Stat};

/// Legacy records under the `v1` namespace, addressed by the same
/// family-prefixed keys as the current store.
#[derive(Debug, Clone)]
pub struct LegacyStore<B: StorageBackend> {
    typed: TypedStore<B>,
}

/// Key prefix of a family's legacy records. Cost details have none in
/// this store.
pub fn family_prefix(family: Family) -> Option<&'static str> {
    match family {
        Family::Accounts => Some(keys::ACCOUNT_PREFIX),
        Family::ActionPlans => Some(keys::ACTION_PLAN_PREFIX),
        Family::ActionTriggers => Some(keys::ACTION_TRIGGER_PREFIX),
        Family::Actions => Some(keys::ACTION_PREFIX),
        Family::SharedGroups => Some(keys::SHARED_GROUP_PREFIX),
        Family::Stats => Some(keys::CDR_STATS_PREFIX),
        Family::CostDetails => None,
    }
}

impl<B: StorageBackend> LegacyStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            typed: TypedStore::new(backend, keys::LEGACY_NAMESPACE),
        }
    }

    /// Every legacy key of `family`, in key order.
    pub async fn keys(&self, family: Family) -> Result<Vec<String>, StorageError> {
        match family_prefix(family) {
            Some(prefix) => self.typed.keys(prefix).await,
            None => Ok(Vec::new()),
        }
    }

    /// Stored bytes under `key`, undecoded; `None` when absent.
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.typed.get_bytes(key).await
    }

    /// Consume a migrated record.
    pub async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.typed.delete(key).await
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<V1Account>, StorageError> {
        self.typed.get(&keys::account(id)).await
    }

    pub async fn set_account(&self, account: &V1Account) -> Result<(), StorageError> {
        self.typed.put(&keys::account(&account.id), account).await
    }

    pub async fn set_action_plans(&self, id: &str, plans: &[V1ActionPlan]) -> Result<(), StorageError> {
        self.typed.put(&keys::action_plan(id), plans).await
    }

    pub async fn set_action_triggers(
        &self,
        id: &str,
        triggers: &[V1ActionTrigger],
    ) -> Result<(), StorageError> {
        self.typed.put(&keys::action_triggers(id), triggers).await
    }

    pub async fn set_actions(&self, id: &str, actions: &[V1Action]) -> Result<(), StorageError> {
        self.typed.put(&keys::actions(id), actions).await
    }

    pub async fn set_shared_group(&self, group: &V1SharedGroup) -> Result<(), StorageError> {
        self.typed.put(&keys::shared_group(&group.id), group).await
    }

    pub async fn set_stats(&self, stat: &V1Stat) -> Result<(), StorageError> {
        self.typed.put(&keys::cdr_stats(&stat.id), stat).await
    }
}
