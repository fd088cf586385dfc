// SPDX-License-Identifier: PMPL-1.0-or-later
//! Entity families: the unit of version tracking and migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::versions;

/// Closed set of migratable families, addressed on the command line by
/// their `*`-prefixed tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    #[serde(rename = "*accounts")]
    Accounts,
    #[serde(rename = "*action_plans")]
    ActionPlans,
    #[serde(rename = "*action_triggers")]
    ActionTriggers,
    #[serde(rename = "*actions")]
    Actions,
    #[serde(rename = "*shared_groups")]
    SharedGroups,
    #[serde(rename = "*stats")]
    Stats,
    #[serde(rename = "*cost_details")]
    CostDetails,
}

impl Family {
    pub const ALL: [Family; 7] = [
        Family::Accounts,
        Family::ActionPlans,
        Family::ActionTriggers,
        Family::Actions,
        Family::SharedGroups,
        Family::Stats,
        Family::CostDetails,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Family::Accounts => "*accounts",
            Family::ActionPlans => "*action_plans",
            Family::ActionTriggers => "*action_triggers",
            Family::Actions => "*actions",
            Family::SharedGroups => "*shared_groups",
            Family::Stats => "*stats",
            Family::CostDetails => "*cost_details",
        }
    }

    /// Version-stamp entries advanced when this family migrates.
    ///
    /// Thresholds are produced by the stats migration, so both move together.
    pub fn version_keys(self) -> &'static [&'static str] {
        match self {
            Family::Accounts => &[versions::ACCOUNTS],
            Family::ActionPlans => &[versions::ACTION_PLANS],
            Family::ActionTriggers => &[versions::ACTION_TRIGGERS],
            Family::Actions => &[versions::ACTIONS],
            Family::SharedGroups => &[versions::SHARED_GROUPS],
            Family::Stats => &[versions::STATS, versions::THRESHOLDS],
            Family::CostDetails => &[versions::COST_DETAILS],
        }
    }

    /// Operator command that migrates this family.
    pub fn remediation(self) -> &'static str {
        match self {
            Family::Accounts => "billstore-migrator -migrate=*accounts",
            Family::ActionPlans => "billstore-migrator -migrate=*action_plans",
            Family::ActionTriggers => "billstore-migrator -migrate=*action_triggers",
            Family::Actions => "billstore-migrator -migrate=*actions",
            Family::SharedGroups => "billstore-migrator -migrate=*shared_groups",
            Family::Stats => "billstore-migrator -migrate=*stats",
            Family::CostDetails => "billstore-migrator -migrate=*cost_details",
        }
    }

    /// Parse a comma-separated tag list, e.g. `*accounts,*stats`.
    pub fn parse_list(raw: &str) -> Result<Vec<Family>, EngineError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<Family>)
            .collect()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Family {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.tag() == s)
            .ok_or_else(|| EngineError::UnknownFamily(s.to_string()))
    }
}
