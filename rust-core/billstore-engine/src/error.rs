// SPDX-License-Identifier: PMPL-1.0-or-later
//! Engine error types.

use thiserror::Error;

use billstore_storage::StorageError;

/// Errors raised while building or loading current-shape billing entities.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unsupported stat metric: {0}")]
    UnknownMetric(String),

    #[error("invalid request filter: {0}")]
    InvalidFilter(String),

    #[error("unknown threshold type: {0}")]
    UnknownThresholdType(String),

    #[error("unknown migration family: {0}")]
    UnknownFamily(String),

    #[error("unknown storage kind: {0}")]
    UnknownStorageKind(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by the startup version gate.
#[derive(Error, Debug)]
pub enum VersionError {
    /// The store holds data but carries no version stamp at all.
    #[error("migration needed: please back up billing data and run <billstore-migrator>")]
    MigrationRequired,

    /// The stamp disagrees with the running release for at least one family.
    #[error("migration needed: please back up billing data and run <{remediation}>")]
    Stale { remediation: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
