// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accounts, their balances and unit counters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::ActionTrigger;
use super::balance_filter::{BalanceFilter, RITiming, ValueFactor};
use crate::sets::StringSet;

/// A single balance inside an account's balance chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub uuid: String,
    pub id: String,
    pub value: f64,
    pub directions: StringSet,
    pub expiration_date: Option<DateTime<Utc>>,
    pub weight: f64,
    pub destination_ids: StringSet,
    pub rating_subject: String,
    pub categories: StringSet,
    pub shared_groups: StringSet,
    pub timings: Vec<RITiming>,
    pub timing_ids: StringSet,
    pub disabled: bool,
    pub factor: ValueFactor,
    pub blocker: bool,
}

/// One counted value and the filter selecting what it counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterFilter {
    pub value: f64,
    pub filter: Option<BalanceFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitCounter {
    /// `*event` or `*balance`.
    pub counter_type: String,
    pub counters: Vec<CounterFilter>,
}

/// A billing account. Balance chains and unit counters are keyed by
/// balance type (`*monetary`, `*voice`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// `<tenant>:<account>`
    pub id: String,
    pub balance_map: BTreeMap<String, Vec<Balance>>,
    pub unit_counters: BTreeMap<String, Vec<UnitCounter>>,
    pub action_triggers: Vec<ActionTrigger>,
    pub allow_negative: bool,
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let account: Account = serde_json::from_str(r#"{"id":"t:1"}"#).unwrap();
        assert_eq!(account.id, "t:1");
        assert!(account.balance_map.is_empty());
        assert!(!account.allow_negative);
    }
}
