// SPDX-License-Identifier: PMPL-1.0-or-later
//! Migrator error types.

use billstore_engine::{BackendClass, EngineError, Family};
use billstore_storage::StorageError;
use thiserror::Error;

/// Why a single legacy record could not be turned into current entities.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("unreadable legacy record: {0}")]
    Unreadable(#[from] serde_json::Error),

    #[error("malformed account id {0:?}")]
    MalformedAccountId(String),

    #[error("malformed balance key {0:?}")]
    MalformedBalanceKey(String),

    #[error("trigger {trigger}: unknown threshold type {threshold_type:?}")]
    UnknownThresholdType {
        trigger: String,
        threshold_type: String,
    },

    /// The record has no id to key its current entities by.
    #[error("{0} without id")]
    MissingId(&'static str),

    /// A stats criterion or metric the current model rejects.
    #[error("invalid stats config: {0}")]
    Stats(#[from] EngineError),
}

/// Errors raised while migrating a family. Every per-record error names the
/// family and key so the operator can retry.
#[derive(Error, Debug)]
pub enum MigratorError {
    /// No transform exists for this family on this backend class.
    #[error("migration of {family} is not implemented for {class} storage")]
    NotImplemented { family: Family, class: BackendClass },

    /// A legacy record could not be interpreted.
    #[error("cannot transform {family} record {key}: {source}")]
    Transform {
        family: Family,
        key: String,
        #[source]
        source: TransformError,
    },

    /// Reading, writing or consuming a record failed.
    #[error("store failure migrating {family} record {key}: {source}")]
    Store {
        family: Family,
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("invalid migrator configuration: {0}")]
    Config(String),
}

impl MigratorError {
    /// Family the error belongs to, if any.
    pub fn family(&self) -> Option<Family> {
        match self {
            MigratorError::NotImplemented { family, .. }
            | MigratorError::Transform { family, .. }
            | MigratorError::Store { family, .. } => Some(*family),
            MigratorError::Config(_) => None,
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, MigratorError::NotImplemented { .. })
    }

    pub(crate) fn transform(family: Family, key: &str, source: TransformError) -> Self {
        MigratorError::Transform {
            family,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn store(family: Family, key: &str, source: StorageError) -> Self {
        MigratorError::Store {
            family,
            key: key.to_string(),
            source,
        }
    }

    /// Attach family and key context to an engine error raised while
    /// writing current records.
    pub(crate) fn from_engine(family: Family, key: &str, err: EngineError) -> Self {
        match err {
            EngineError::Storage(source) => Self::store(family, key, source),
            other => Self::transform(family, key, TransformError::Stats(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = MigratorError::NotImplemented {
            family: Family::CostDetails,
            class: BackendClass::Keyed,
        };
        assert_eq!(
            err.to_string(),
            "migration of *cost_details is not implemented for keyed storage"
        );
        assert!(err.is_not_implemented());
        assert_eq!(err.family(), Some(Family::CostDetails));

        let err = MigratorError::from_engine(
            Family::Stats,
            "cst_test",
            EngineError::Storage(StorageError::BackendUnavailable("down".into())),
        );
        assert!(matches!(err, MigratorError::Store { .. }));
        assert!(err.to_string().contains("cst_test"));

        let err = MigratorError::from_engine(
            Family::Stats,
            "cst_test",
            EngineError::UnknownMetric("*nope".into()),
        );
        assert!(matches!(
            err,
            MigratorError::Transform {
                source: TransformError::Stats(EngineError::UnknownMetric(_)),
                ..
            }
        ));
        assert_eq!(MigratorError::Config("x".into()).family(), None);
    }

    #[test]
    fn test_transform_error_is_the_source() {
        use std::error::Error as _;

        let err = MigratorError::transform(
            Family::Accounts,
            "acc_a:b:c:d",
            TransformError::MalformedAccountId("a:b:c:d".into()),
        );
        assert_eq!(
            err.to_string(),
            "cannot transform *accounts record acc_a:b:c:d: malformed account id \"a:b:c:d\""
        );
        assert!(err
            .source()
            .and_then(|s| s.downcast_ref::<TransformError>())
            .is_some());
    }
}
