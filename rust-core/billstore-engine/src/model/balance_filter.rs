// SPDX-License-Identifier: PMPL-1.0-or-later
//! Balance matching filters and the timing structures they carry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sets::StringSet;

/// A recurring timing window (years, months, days, clock range).
///
/// Empty lists mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RITiming {
    pub years: Vec<i32>,
    pub months: Vec<u32>,
    pub month_days: Vec<i32>,
    pub week_days: Vec<u32>,
    pub start_time: String,
    pub end_time: String,
}

/// A weighted timing used by action plans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateInterval {
    pub timing: Option<RITiming>,
    pub weight: f64,
}

/// Per-category multipliers applied to a balance; empty is the zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueFactor(pub BTreeMap<String, f64>);

impl ValueFactor {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Matches balances for actions, triggers and unit counters.
///
/// Every scalar is optional: `None` means "do not match on this field",
/// which is different from matching the field's zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub balance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directions: Option<StringSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_ids: Option<StringSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<StringSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_groups: Option<StringSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ids: Option<StringSet>,
    pub timings: Vec<RITiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<ValueFactor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocker: Option<bool>,
}

impl BalanceFilter {
    /// True when the filter constrains nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_fields_are_omitted() {
        let filter = BalanceFilter {
            balance_type: Some("*monetary".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["type"], "*monetary");
        assert!(json.get("weight").is_none());
        assert!(json.get("directions").is_none());
    }

    #[test]
    fn test_explicit_zero_survives_round_trip() {
        let filter = BalanceFilter {
            weight: Some(0.0),
            ..Default::default()
        };
        let back: BalanceFilter =
            serde_json::from_str(&serde_json::to_string(&filter).unwrap()).unwrap();
        assert_eq!(back.weight, Some(0.0));
        assert!(back.value.is_none());
        assert!(!back.is_empty());
        assert!(BalanceFilter::default().is_empty());
    }
}
