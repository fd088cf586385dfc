// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end migration passes over an in-memory backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use billstore_engine::model::{
    Direction, RequestFilter, StatQueueProfile, ThresholdType, META_GREATER_OR_EQUAL,
};
use billstore_engine::versions::current_versions;
use billstore_engine::{BackendClass, Family, StorageKind, StringSet, VersionError, Versions};
use billstore_migrator::legacy::{
    V1Account, V1Action, V1ActionPlan, V1ActionTrigger, V1Balance, V1SharedGroup, V1Stat,
};
use billstore_migrator::{FamilyState, MigratorConfig, Migrator, MigratorError, TransformError};
use billstore_storage::{InMemoryBackend, StorageBackend, StorageError};

/// In-memory backend whose n-th batch write fails (1-based, 0 = never).
#[derive(Debug, Clone, Default)]
struct FaultBackend {
    inner: InMemoryBackend,
    batches: Arc<AtomicUsize>,
    fail_on: Arc<AtomicUsize>,
}

impl FaultBackend {
    fn failing_batch(n: usize) -> Self {
        let backend = Self::default();
        backend.fail_on.store(n, Ordering::SeqCst);
        backend
    }

    fn heal(&self) {
        self.fail_on.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageBackend for FaultBackend {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &[u8]) -> Result<bool, StorageError> {
        self.inner.delete(key).await
    }

    async fn scan_prefix(
        &self,
        prefix: &[u8],
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        self.inner.scan_prefix(prefix, limit).await
    }

    async fn batch_put(&self, entries: &[(&[u8], &[u8])]) -> Result<(), StorageError> {
        let n = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on.load(Ordering::SeqCst) {
            return Err(StorageError::BackendUnavailable(format!("injected fault on batch {n}")));
        }
        self.inner.batch_put(entries).await
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        self.inner.clear().await
    }

    async fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "fault"
    }
}

fn keyed() -> MigratorConfig {
    MigratorConfig {
        storage_kind: StorageKind::Redis,
        ..Default::default()
    }
}

async fn data_snapshot<B: StorageBackend>(backend: &B) -> Vec<(Vec<u8>, Vec<u8>)> {
    backend.scan_prefix(b"data:", usize::MAX).await.unwrap()
}

#[tokio::test]
async fn accounts_move_to_sets_and_new_ids() {
    let m = Migrator::new(InMemoryBackend::new(), keyed()).unwrap();
    let mut balance_map = BTreeMap::new();
    balance_map.insert(
        "*voice*out".to_string(),
        vec![V1Balance {
            value: 10.0,
            weight: 10.0,
            destination_ids: "NAT".into(),
            ..Default::default()
        }],
    );
    m.legacy()
        .set_account(&V1Account {
            id: "*OUT:CUSTOMER_1:rif".into(),
            balance_map,
            ..Default::default()
        })
        .await
        .unwrap();

    let report = m.migrate(&[Family::Accounts]).await.unwrap();
    assert!(report.migrated());
    assert_eq!(report.outcome(Family::Accounts).unwrap().state, FamilyState::Complete);

    let account = m.data().get_account("CUSTOMER_1:rif").await.unwrap().unwrap();
    let balance = &account.balance_map["*voice"][0];
    assert_eq!(balance.value, 10.0);
    assert_eq!(balance.weight, 10.0);
    assert_eq!(balance.destination_ids, StringSet::singleton("NAT"));
    assert_eq!(balance.directions, StringSet::singleton(Direction::Out.as_str()));
    assert_eq!(balance.directions, StringSet::singleton("*out"));
}

#[tokio::test]
async fn shared_group_members_become_a_set() {
    let m = Migrator::new(InMemoryBackend::new(), keyed()).unwrap();
    m.legacy()
        .set_shared_group(&V1SharedGroup {
            id: "Test".into(),
            member_ids: vec!["1".into(), "2".into(), "3".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    m.migrate(&[Family::SharedGroups]).await.unwrap();

    let group = m.data().get_shared_group("Test").await.unwrap().unwrap();
    let expected: StringSet = ["3", "2", "1"].into_iter().collect();
    assert_eq!(group.member_ids, expected);
}

#[tokio::test]
async fn unreadable_bytes_fail_as_a_transform() {
    let backend = InMemoryBackend::new();
    let m = Migrator::new(backend.clone(), keyed()).unwrap();
    backend.put(b"v1:shg_G", b"\xff not json").await.unwrap();

    let err = m.migrate(&[Family::SharedGroups]).await.unwrap_err();
    match err {
        MigratorError::Transform { family, key, source } => {
            assert_eq!(family, Family::SharedGroups);
            assert_eq!(key, "shg_G");
            assert!(matches!(source, TransformError::Unreadable(_)));
        }
        other => panic!("expected a transform error, got: {other:?}"),
    }
    assert_eq!(m.legacy().keys(Family::SharedGroups).await.unwrap(), vec!["shg_G"]);
    assert!(m.data().get_versions().await.is_err());
}

#[tokio::test]
async fn stats_fan_out_into_three_records() {
    let m = Migrator::new(InMemoryBackend::new(), keyed()).unwrap();
    let prior: Versions = [("Stats", 1i64)].into_iter().collect();
    m.data().set_versions(&prior, true).await.unwrap();
    m.legacy()
        .set_stats(&V1Stat {
            id: "test".into(),
            queue_length: 10,
            time_window: Duration::from_secs(1),
            save_interval: Duration::from_secs(1),
            metrics: vec!["ASR".into(), "ACD".into(), "ACC".into()],
            usage_interval: vec![Duration::from_secs(1), Duration::from_secs(60)],
            triggers: vec![V1ActionTrigger {
                id: "Test".into(),
                threshold_type: "*max_balance".into(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .await
        .unwrap();

    let report = m.migrate(&[Family::Stats]).await.unwrap();
    assert_eq!(report.outcome(Family::Stats).unwrap().entities, 3);

    let tenant = "billstore.org";
    let filter = m.data().get_filter(tenant, "test").await.unwrap().unwrap();
    assert_eq!(
        filter.request_filters,
        vec![RequestFilter::new(META_GREATER_OR_EQUAL, "UsageInterval", vec!["1s".into()]).unwrap()]
    );

    let profile: StatQueueProfile =
        m.data().get_stat_queue_profile(tenant, "test").await.unwrap().unwrap();
    assert_eq!(profile.filter_ids, vec![filter.id.clone()]);
    assert_eq!(profile.thresholds, vec!["Test"]);
    assert!(profile.stored);

    let queue = m.data().get_stat_queue(tenant, "test").await.unwrap().unwrap();
    assert_eq!(queue.sq_metrics.len(), profile.metrics.len());
    assert!(profile.metrics.iter().all(|id| queue.sq_metrics.contains_key(id)));

    let stamp = m.data().get_versions().await.unwrap();
    assert_eq!(stamp.get("Stats"), 2);
    assert_eq!(stamp.get("Thresholds"), 2);
}

#[tokio::test]
async fn triggers_and_plans_and_actions_on_keyed_store() {
    let m = Migrator::new(InMemoryBackend::new(), keyed()).unwrap();
    m.legacy()
        .set_action_triggers(
            "STANDARD",
            &[V1ActionTrigger {
                id: "T1".into(),
                threshold_type: "*min_counter".into(),
                balance_direction: "*out".into(),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    m.legacy()
        .set_actions(
            "TOPUP",
            &[V1Action {
                id: "TOPUP".into(),
                action_type: "*topup_reset".into(),
                balance_type: "*monetary".into(),
                direction: "*out".into(),
                ..Default::default()
            }],
        )
        .await
        .unwrap();
    m.legacy()
        .set_action_plans(
            "MONTHLY",
            &[V1ActionPlan {
                id: "MONTHLY".into(),
                account_ids: vec!["*OUT:t:1001".into()],
                actions_id: "TOPUP".into(),
                ..Default::default()
            }],
        )
        .await
        .unwrap();

    let report = m
        .migrate(&[Family::ActionTriggers, Family::Actions, Family::ActionPlans])
        .await
        .unwrap();
    assert_eq!(report.outcomes().len(), 3);

    let triggers = m.data().get_action_triggers("STANDARD").await.unwrap().unwrap();
    assert_eq!(triggers[0].threshold_type, ThresholdType::MinEventCounter);
    let actions = m.data().get_actions("TOPUP").await.unwrap().unwrap();
    assert_eq!(actions[0].action_type, "*topup_reset");
    let plan = m.data().get_action_plan("MONTHLY").await.unwrap().unwrap();
    assert_eq!(plan.account_ids, StringSet::singleton("t:1001"));
}

#[tokio::test]
async fn migration_is_idempotent() {
    for consume_legacy in [true, false] {
        let backend = InMemoryBackend::new();
        let config = MigratorConfig {
            consume_legacy,
            ..keyed()
        };
        let m = Migrator::new(backend.clone(), config).unwrap();
        m.legacy()
            .set_shared_group(&V1SharedGroup {
                id: "G".into(),
                member_ids: vec!["a".into(), "b".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        m.legacy()
            .set_action_plans(
                "P",
                &[V1ActionPlan {
                    id: "P".into(),
                    account_ids: vec!["t:1".into()],
                    ..Default::default()
                }],
            )
            .await
            .unwrap();
        let families = [Family::SharedGroups, Family::ActionPlans];

        m.migrate(&families).await.unwrap();
        let first = data_snapshot(&backend).await;
        let second_report = m.migrate(&families).await.unwrap();
        let second = data_snapshot(&backend).await;

        assert_eq!(first, second, "consume_legacy = {consume_legacy}");
        assert_eq!(second_report.migrated(), !consume_legacy);
    }
}

#[tokio::test]
async fn failed_write_keeps_earlier_records_and_stamp() {
    let backend = FaultBackend::failing_batch(3);
    let m = Migrator::new(backend.clone(), keyed()).unwrap();
    for i in 1..=5 {
        m.legacy()
            .set_shared_group(&V1SharedGroup {
                id: format!("G{i}"),
                member_ids: vec![i.to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let err = m.migrate(&[Family::SharedGroups]).await.unwrap_err();
    match &err {
        MigratorError::Store { family, key, .. } => {
            assert_eq!(*family, Family::SharedGroups);
            assert_eq!(key, "shg_G3");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(m.data().get_shared_group("G1").await.unwrap().is_some());
    assert!(m.data().get_shared_group("G2").await.unwrap().is_some());
    assert!(m.data().get_shared_group("G3").await.unwrap().is_none());
    assert!(m.data().get_versions().await.unwrap_err().is_not_found());
    assert_eq!(
        m.legacy().keys(Family::SharedGroups).await.unwrap(),
        vec!["shg_G3", "shg_G4", "shg_G5"]
    );

    // A second pass resumes with what is left.
    backend.heal();
    let report = m.migrate(&[Family::SharedGroups]).await.unwrap();
    assert_eq!(report.outcome(Family::SharedGroups).unwrap().records, 3);
    for i in 1..=5 {
        assert!(m.data().get_shared_group(&format!("G{i}")).await.unwrap().is_some());
    }
    assert_eq!(m.data().get_versions().await.unwrap().get("SharedGroups"), 2);
}

#[tokio::test]
async fn unsupported_family_stops_or_is_reported() {
    let m = Migrator::new(InMemoryBackend::new(), MigratorConfig::default()).unwrap();
    assert_eq!(m.class(), BackendClass::Combined);

    let err = m
        .migrate(&[Family::ActionTriggers, Family::SharedGroups])
        .await
        .unwrap_err();
    assert!(err.is_not_implemented());
    assert_eq!(err.family(), Some(Family::ActionTriggers));
    assert!(m.data().get_versions().await.is_err());

    let lenient = Migrator::new(
        InMemoryBackend::new(),
        MigratorConfig {
            continue_on_unsupported: true,
            ..Default::default()
        },
    )
    .unwrap();
    let report = lenient
        .migrate(&[Family::CostDetails, Family::SharedGroups])
        .await
        .unwrap();
    let skipped = report.outcome(Family::CostDetails).unwrap();
    assert_eq!(skipped.state, FamilyState::Failed);
    assert!(skipped.note.as_deref().unwrap().contains("not implemented"));
    assert_eq!(
        report.outcome(Family::SharedGroups).unwrap().state,
        FamilyState::Complete
    );
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let backend = InMemoryBackend::new();
    let m = Migrator::new(
        backend.clone(),
        MigratorConfig {
            dry_run: true,
            ..keyed()
        },
    )
    .unwrap();
    m.legacy()
        .set_shared_group(&V1SharedGroup {
            id: "G".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let report = m.migrate(&[Family::SharedGroups, Family::Stats]).await.unwrap();
    assert_eq!(report.outcome(Family::SharedGroups).unwrap().records, 1);
    assert!(data_snapshot(&backend).await.is_empty());
    assert_eq!(m.legacy().keys(Family::SharedGroups).await.unwrap(), vec!["shg_G"]);
}

#[tokio::test]
async fn gate_clears_once_stale_family_is_migrated() {
    let m = Migrator::new(InMemoryBackend::new(), keyed()).unwrap();
    let mut stamp = current_versions(BackendClass::Keyed);
    stamp.set("Stats", 1);
    stamp.set("Thresholds", 1);
    m.data().set_versions(&stamp, true).await.unwrap();

    match m.check().await {
        Err(VersionError::Stale { remediation }) => {
            assert_eq!(remediation, "billstore-migrator -migrate=*stats");
        }
        other => panic!("expected stale stamp, got {other:?}"),
    }

    m.migrate(&[Family::Stats]).await.unwrap();
    m.check().await.unwrap();
}
