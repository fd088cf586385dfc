// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// BillStore Storage Backend Abstraction
//
// Every billing store (the live data store and the legacy store the migrator
// reads from) sits on top of the `StorageBackend` trait defined here, so the
// engine can run against an in-process map during tests and against a
// persistent file in production without knowing the difference.
//
// # Modules
//
// - [`backend`] -- The `StorageBackend` trait defining the key-value interface.
// - [`error`] -- The `StorageError` enum covering all backend failure modes.
// - [`memory`] -- An in-memory `BTreeMap`-based backend for tests and the
//   `internal` storage kind.
// - [`typed`] -- A serde-based typed wrapper with namespace prefixing.
//
// # Example
//
// ```rust
// use billstore_storage::memory::InMemoryBackend;
// use billstore_storage::typed::TypedStore;
//
// # tokio_test::block_on(async {
// let raw = InMemoryBackend::new();
// let store = TypedStore::new(raw, "data");
// store.put("acc_1001", &serde_json::json!({"ID": "1001"})).await.unwrap();
//
// let val: serde_json::Value = store.get("acc_1001").await.unwrap().unwrap();
// assert_eq!(val["ID"], "1001");
// # });
// ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod typed;

// Optional persistent backends, feature-gated to keep the default build lean.
#[cfg(feature = "redb-backend")]
pub mod redb_backend;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use memory::InMemoryBackend;
pub use typed::TypedStore;

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
