// SPDX-License-Identifier: PMPL-1.0-or-later
//! Migration orchestrator.
//!
//! Families are migrated one after another in the order requested. Within a
//! family every legacy record is read, transformed and written before the
//! next one is touched; the first failure aborts the family and leaves the
//! records already written in place. A family's version stamp only moves
//! once all of its records made it across.

use std::fmt;

use billstore_engine::versions::family_targets;
use billstore_engine::{check_versions, BackendClass, DataStore, Family, VersionError};
use billstore_storage::StorageBackend;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MigratorConfig;
use crate::error::MigratorError;
use crate::legacy::{family_prefix, LegacyStore};
use crate::transform::{self, TransformContext, TransformFn};

/// Lifecycle of one family within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FamilyState {
    NotStarted,
    InProgress,
    Complete,
    Failed,
}

impl fmt::Display for FamilyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyState::NotStarted => write!(f, "not_started"),
            FamilyState::InProgress => write!(f, "in_progress"),
            FamilyState::Complete => write!(f, "complete"),
            FamilyState::Failed => write!(f, "failed"),
        }
    }
}

/// What happened to one requested family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyOutcome {
    pub family: Family,
    pub state: FamilyState,
    /// Legacy records transformed.
    pub records: usize,
    /// Current entities produced from them.
    pub entities: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FamilyOutcome {
    fn new(family: Family) -> Self {
        Self {
            family,
            state: FamilyState::NotStarted,
            records: 0,
            entities: 0,
            note: None,
        }
    }
}

/// Per-family results of a [`Migrator::migrate`] pass, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    outcomes: Vec<FamilyOutcome>,
}

impl MigrationReport {
    pub fn outcomes(&self) -> &[FamilyOutcome] {
        &self.outcomes
    }

    /// Latest outcome recorded for `family`.
    pub fn outcome(&self, family: Family) -> Option<&FamilyOutcome> {
        self.outcomes.iter().rev().find(|o| o.family == family)
    }

    /// True when at least one legacy record was transformed.
    pub fn migrated(&self) -> bool {
        self.outcomes.iter().any(|o| o.records > 0)
    }
}

/// Moves legacy records of one backend into their current shape.
///
/// Legacy and current records share the backend under different
/// namespaces, so one handle is cloned into both stores.
#[derive(Debug)]
pub struct Migrator<B: StorageBackend + Clone> {
    legacy: LegacyStore<B>,
    data: DataStore<B>,
    class: BackendClass,
    config: MigratorConfig,
    ctx: TransformContext,
}

impl<B: StorageBackend + Clone> Migrator<B> {
    pub fn new(backend: B, config: MigratorConfig) -> Result<Self, MigratorError> {
        config.validate()?;
        let class = config.storage_kind.class();
        let ctx = TransformContext {
            tenant: config.default_tenant.trim().to_string(),
        };
        Ok(Self {
            legacy: LegacyStore::new(backend.clone()),
            data: DataStore::new(backend),
            class,
            config,
            ctx,
        })
    }

    pub fn legacy(&self) -> &LegacyStore<B> {
        &self.legacy
    }

    pub fn data(&self) -> &DataStore<B> {
        &self.data
    }

    pub fn class(&self) -> BackendClass {
        self.class
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Run the startup version gate against the current store.
    pub async fn check(&self) -> Result<(), VersionError> {
        check_versions(&self.data, self.class).await
    }

    /// Migrate `families` in order.
    ///
    /// Returns the first error unless it is an unsupported family and
    /// `continue_on_unsupported` is set, in which case the family is
    /// reported as failed and the pass goes on.
    pub async fn migrate(&self, families: &[Family]) -> Result<MigrationReport, MigratorError> {
        let mut report = MigrationReport::default();

        for &family in families {
            let Some(transform) = transform::lookup(family, self.class) else {
                let err = MigratorError::NotImplemented {
                    family,
                    class: self.class,
                };
                if !self.config.continue_on_unsupported {
                    return Err(err);
                }
                warn!(family = %family, class = %self.class, "skipping unsupported family");
                let mut outcome = FamilyOutcome::new(family);
                outcome.state = FamilyState::Failed;
                outcome.note = Some(err.to_string());
                report.outcomes.push(outcome);
                continue;
            };

            match self.migrate_family(family, transform).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    warn!(family = %family, state = %FamilyState::Failed, error = %err, "family migration aborted");
                    return Err(err);
                }
            }
        }

        Ok(report)
    }

    async fn migrate_family(
        &self,
        family: Family,
        transform: TransformFn,
    ) -> Result<FamilyOutcome, MigratorError> {
        let mut outcome = FamilyOutcome::new(family);

        let keys = self
            .legacy
            .keys(family)
            .await
            .map_err(|e| MigratorError::store(family, family_prefix(family).unwrap_or(""), e))?;

        if keys.is_empty() {
            info!(family = %family, "no legacy records");
            outcome.state = FamilyState::Complete;
            self.advance_stamp(family).await;
            return Ok(outcome);
        }

        outcome.state = FamilyState::InProgress;
        info!(
            family = %family,
            records = keys.len(),
            dry_run = self.config.dry_run,
            "migrating family"
        );

        for key in &keys {
            let Some(raw) = self
                .legacy
                .get_raw(key)
                .await
                .map_err(|e| MigratorError::store(family, key, e))?
            else {
                debug!(family = %family, key = %key, "legacy record vanished, skipping");
                continue;
            };

            let entities = transform(&self.ctx, key, &raw)
                .map_err(|e| MigratorError::transform(family, key, e))?;

            if !self.config.dry_run {
                self.data
                    .set_entities(&entities)
                    .await
                    .map_err(|e| MigratorError::from_engine(family, key, e))?;
                if self.config.consume_legacy {
                    self.legacy
                        .remove(key)
                        .await
                        .map_err(|e| MigratorError::store(family, key, e))?;
                }
            }

            debug!(family = %family, key = %key, entities = entities.len(), "migrated record");
            outcome.records += 1;
            outcome.entities += entities.len();
        }

        outcome.state = FamilyState::Complete;
        info!(
            family = %family,
            records = outcome.records,
            entities = outcome.entities,
            "family migrated"
        );
        self.advance_stamp(family).await;
        Ok(outcome)
    }

    /// Move the stamp entries owned by `family` to their targets. Entries
    /// already current are left alone.
    async fn advance_stamp(&self, family: Family) {
        if self.config.dry_run {
            return;
        }
        let targets = family_targets(family);
        if let Ok(stored) = self.data.get_versions().await {
            if targets.iter().all(|(name, version)| stored.get(name) == version) {
                debug!(family = %family, "version stamp already current");
                return;
            }
        }
        match self.data.set_versions(&targets, false).await {
            Ok(()) => info!(family = %family, "version stamp advanced"),
            Err(err) => warn!(family = %family, error = %err, "could not advance version stamp"),
        }
    }
}
