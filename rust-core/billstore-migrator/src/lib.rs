// SPDX-License-Identifier: PMPL-1.0-or-later
//! BillStore Migrator
//!
//! Offline tool that rewrites legacy (v1) billing records into their
//! current shape, family by family, and advances the version stamp the
//! engine's startup gate checks.
//!
//! Legacy records live under the `v1` namespace and current records under
//! `data` on the same backend, keyed by the same family prefixes.

pub mod config;
pub mod error;
pub mod legacy;
pub mod migrator;
pub mod transform;

pub use config::{MigratorConfig, DEFAULT_TENANT};
pub use error::{MigratorError, TransformError};
pub use migrator::{FamilyOutcome, FamilyState, MigrationReport, Migrator};
