// SPDX-License-Identifier: PMPL-1.0-or-later
//! Legacy (v1) record shapes and their store.

pub mod model;
mod store;

pub use model::{
    V1Account, V1Action, V1ActionPlan, V1ActionTrigger, V1Balance, V1SharedGroup, V1Stat,
    V1UnitsCounter,
};
pub use store::{family_prefix, LegacyStore};
