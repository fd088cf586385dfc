// SPDX-License-Identifier: PMPL-1.0-or-later
//! Schema version registry, comparator and startup gate.
//!
//! Every family carries its own integer version. A store persists one stamp
//! (family name -> version) under [`crate::keys::VERSIONS_KEY`]; the running
//! release knows the target for each family. Startup refuses to serve a
//! store whose stamp lags behind, naming the migrator command that fixes it.
//!
//! The comparator reports only the first stale family of the class's fixed
//! order. Operators re-run the check after each remediation step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use billstore_storage::StorageBackend;

use crate::class::BackendClass;
use crate::error::VersionError;
use crate::family::Family;
use crate::store::DataStore;

pub const STATS: &str = "Stats";
pub const ACCOUNTS: &str = "Accounts";
pub const ACTIONS: &str = "Actions";
pub const ACTION_TRIGGERS: &str = "ActionTriggers";
pub const ACTION_PLANS: &str = "ActionPlans";
pub const SHARED_GROUPS: &str = "SharedGroups";
pub const THRESHOLDS: &str = "Thresholds";
pub const COST_DETAILS: &str = "CostDetails";

/// Targets for families held by the keyed (data) store.
const DATA_TARGETS: &[(&str, i64)] = &[
    (STATS, 2),
    (ACCOUNTS, 2),
    (ACTIONS, 2),
    (ACTION_TRIGGERS, 2),
    (ACTION_PLANS, 2),
    (SHARED_GROUPS, 2),
    (THRESHOLDS, 2),
];

/// Targets for families held by the detail store.
const DETAIL_TARGETS: &[(&str, i64)] = &[(COST_DETAILS, 2)];

/// Comparator order and the family whose migration fixes each entry.
const DATA_REMEDIATIONS: &[(&str, Family)] = &[
    (ACCOUNTS, Family::Accounts),
    (ACTIONS, Family::Actions),
    (ACTION_TRIGGERS, Family::ActionTriggers),
    (ACTION_PLANS, Family::ActionPlans),
    (SHARED_GROUPS, Family::SharedGroups),
    (STATS, Family::Stats),
    (THRESHOLDS, Family::Stats),
];

const DETAIL_REMEDIATIONS: &[(&str, Family)] = &[(COST_DETAILS, Family::CostDetails)];

/// A version stamp: family name to version number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Versions(BTreeMap<String, i64>);

impl Versions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored version of `family`; absent entries read as 0.
    pub fn get(&self, family: &str) -> i64 {
        self.0.get(family).copied().unwrap_or(0)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.0.contains_key(family)
    }

    pub fn set(&mut self, family: impl Into<String>, version: i64) {
        self.0.insert(family.into(), version);
    }

    /// Overlay `other` on top of `self`.
    pub fn merge(&mut self, other: &Versions) {
        for (family, version) in &other.0 {
            self.0.insert(family.clone(), *version);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The first family of `class`'s fixed order whose stored version
    /// differs from `current`, if any.
    pub fn first_stale(&self, current: &Versions, class: BackendClass) -> Option<(&'static str, Family)> {
        remediation_table(class)
            .find(|(name, _)| self.get(name) != current.get(name))
    }

    /// Remediation token for the first stale family, or an empty string
    /// when the stamp is up to date for `class`.
    pub fn compare(&self, current: &Versions, class: BackendClass) -> String {
        self.first_stale(current, class)
            .map(|(_, family)| family.remediation().to_string())
            .unwrap_or_default()
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for Versions {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn remediation_table(class: BackendClass) -> impl Iterator<Item = (&'static str, Family)> {
    let (data, detail): (&'static [(&'static str, Family)], &'static [(&'static str, Family)]) =
        match class {
            BackendClass::Combined => (DATA_REMEDIATIONS, DETAIL_REMEDIATIONS),
            BackendClass::Detail => (&[], DETAIL_REMEDIATIONS),
            BackendClass::Keyed => (DATA_REMEDIATIONS, &[]),
        };
    data.iter().chain(detail.iter()).copied()
}

/// Current targets of the keyed (data) store families.
pub fn current_data_versions() -> Versions {
    DATA_TARGETS.iter().copied().collect()
}

/// Current targets of the detail store families.
pub fn current_detail_versions() -> Versions {
    DETAIL_TARGETS.iter().copied().collect()
}

/// The versions relevant to a backend class.
pub fn current_versions(class: BackendClass) -> Versions {
    match class {
        BackendClass::Combined => {
            let mut all = current_data_versions();
            all.merge(&current_detail_versions());
            all
        }
        BackendClass::Detail => current_detail_versions(),
        BackendClass::Keyed => current_data_versions(),
    }
}

/// Target versions for the stamp entries `family` owns.
pub fn family_targets(family: Family) -> Versions {
    let all = current_versions(BackendClass::Combined);
    family
        .version_keys()
        .iter()
        .map(|name| (*name, all.get(name)))
        .collect()
}

/// Startup gate.
///
/// * no stamp, empty store: the current stamp is written and startup goes on.
/// * no stamp, store holds data: [`VersionError::MigrationRequired`].
/// * stale stamp: [`VersionError::Stale`] naming the migrator command.
pub async fn check_versions<B: StorageBackend>(
    store: &DataStore<B>,
    class: BackendClass,
) -> Result<(), VersionError> {
    let current = current_versions(class);
    match store.get_versions().await {
        Ok(stored) => {
            let remediation = stored.compare(&current, class);
            if !remediation.is_empty() {
                info!(%class, %remediation, "stored schema is stale");
                return Err(VersionError::Stale { remediation });
            }
            debug!(%class, "stored schema is current");
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            if !store.is_db_empty().await? {
                info!(%class, "store holds data but no version stamp");
                return Err(VersionError::MigrationRequired);
            }
            info!(%class, "empty store, writing initial version stamp");
            set_db_versions(store, class).await;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Merge the current targets for `class` into the stored stamp.
///
/// A failed write is only logged; the next start retries it.
pub async fn set_db_versions<B: StorageBackend>(store: &DataStore<B>, class: BackendClass) {
    if let Err(err) = store.set_versions(&current_versions(class), false).await {
        warn!(%class, error = %err, "could not write current version stamp");
    }
}
