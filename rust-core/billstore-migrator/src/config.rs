// SPDX-License-Identifier: PMPL-1.0-or-later
//! Migrator configuration.

use billstore_engine::StorageKind;
use serde::{Deserialize, Serialize};

use crate::error::MigratorError;

pub const DEFAULT_TENANT: &str = "billstore.org";

/// How a migration pass behaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Tenant given to entities whose legacy form had none (stats).
    pub default_tenant: String,
    /// Delete each legacy record once its current form is written.
    pub consume_legacy: bool,
    /// Record unsupported families in the report instead of stopping.
    pub continue_on_unsupported: bool,
    /// Transform and log, but write nothing.
    pub dry_run: bool,
    /// Engine behind the store; selects the backend class.
    pub storage_kind: StorageKind,
}

impl MigratorConfig {
    pub fn validate(&self) -> Result<(), MigratorError> {
        let tenant = self.default_tenant.trim();
        if tenant.is_empty() {
            return Err(MigratorError::Config("default_tenant must not be empty".into()));
        }
        if tenant.contains(':') {
            return Err(MigratorError::Config(format!(
                "default_tenant {tenant:?} must not contain ':'"
            )));
        }
        Ok(())
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            default_tenant: DEFAULT_TENANT.to_string(),
            consume_legacy: true,
            continue_on_unsupported: false,
            dry_run: false,
            storage_kind: StorageKind::default(),
        }
    }
}
