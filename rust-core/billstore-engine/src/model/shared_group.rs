// SPDX-License-Identifier: PMPL-1.0-or-later
//! Shared groups: balances pooled across member accounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sets::StringSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingParameters {
    /// `*highest`, `*lowest`, `*mine_highest`, ...
    pub strategy: String,
    pub rating_subject: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedGroup {
    pub id: String,
    /// Per-account sharing rules; `*any` applies to every member.
    pub account_parameters: BTreeMap<String, SharingParameters>,
    pub member_ids: StringSet,
}
