// SPDX-License-Identifier: PMPL-1.0-or-later
//! Backend classes and the concrete storage kinds that map onto them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The role a storage engine can play.
///
/// Some engines can only serve the fast operational data role or only the
/// detail/warehouse role; their relevant version subset is restricted
/// accordingly. A combined engine serves both and is checked against the
/// union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendClass {
    /// Keyed + document store serving both roles.
    Combined,
    /// Relational/detail-only store.
    Detail,
    /// Fast keyed store, data role only.
    Keyed,
}

impl fmt::Display for BackendClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendClass::Combined => "combined",
            BackendClass::Detail => "detail",
            BackendClass::Keyed => "keyed",
        };
        f.write_str(name)
    }
}

/// Concrete storage engine names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Mongo,
    /// The in-process map store.
    Internal,
    Postgres,
    Mysql,
    Redis,
    Redb,
}

impl StorageKind {
    pub fn class(self) -> BackendClass {
        match self {
            StorageKind::Mongo | StorageKind::Internal => BackendClass::Combined,
            StorageKind::Postgres | StorageKind::Mysql => BackendClass::Detail,
            StorageKind::Redis | StorageKind::Redb => BackendClass::Keyed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Mongo => "mongo",
            StorageKind::Internal => "internal",
            StorageKind::Postgres => "postgres",
            StorageKind::Mysql => "mysql",
            StorageKind::Redis => "redis",
            StorageKind::Redb => "redb",
        }
    }
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::Internal
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" => Ok(StorageKind::Mongo),
            "internal" => Ok(StorageKind::Internal),
            "postgres" => Ok(StorageKind::Postgres),
            "mysql" => Ok(StorageKind::Mysql),
            "redis" => Ok(StorageKind::Redis),
            "redb" => Ok(StorageKind::Redb),
            other => Err(EngineError::UnknownStorageKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_to_class() {
        assert_eq!(StorageKind::Mongo.class(), BackendClass::Combined);
        assert_eq!(StorageKind::Internal.class(), BackendClass::Combined);
        assert_eq!(StorageKind::Postgres.class(), BackendClass::Detail);
        assert_eq!(StorageKind::Mysql.class(), BackendClass::Detail);
        assert_eq!(StorageKind::Redis.class(), BackendClass::Keyed);
        assert_eq!(StorageKind::Redb.class(), BackendClass::Keyed);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Redis".parse::<StorageKind>().unwrap(), StorageKind::Redis);
        assert_eq!(" redb ".parse::<StorageKind>().unwrap(), StorageKind::Redb);
        assert!(matches!(
            "cassandra".parse::<StorageKind>(),
            Err(EngineError::UnknownStorageKind(_))
        ));
    }
}
