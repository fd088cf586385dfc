// SPDX-License-Identifier: PMPL-1.0-or-later
//! BillStore Engine
//!
//! Current-shape billing entities, the schema version registry and the
//! startup gate that refuses to serve a store whose records predate the
//! running release.

pub mod class;
pub mod error;
pub mod family;
pub mod keys;
pub mod model;
pub mod sets;
pub mod store;
pub mod versions;

pub use class::{BackendClass, StorageKind};
pub use error::{EngineError, VersionError};
pub use family::Family;
pub use sets::StringSet;
pub use store::DataStore;
pub use versions::{check_versions, current_versions, set_db_versions, Versions};
