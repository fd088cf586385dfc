// SPDX-License-Identifier: PMPL-1.0-or-later
//! Record shapes written by the previous release.
//!
//! Sets were ordered lists or `;`-separated strings, balance-matching fields
//! sat directly on triggers and actions, and statistics lived in one
//! monolithic config. Durations are integer nanoseconds.

use std::collections::BTreeMap;
use std::time::Duration;

use billstore_engine::model::{RITiming, RateInterval, SharingParameters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde adapter for durations stored as integer nanoseconds.
pub(crate) mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos()).map_err(serde::ser::Error::custom)?;
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }

    pub mod list {
        use std::time::Duration;

        use serde::ser::SerializeSeq;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            values: &[Duration],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for value in values {
                let nanos = u64::try_from(value.as_nanos()).map_err(serde::ser::Error::custom)?;
                seq.serialize_element(&nanos)?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Duration>, D::Error> {
            let raw = Vec::<u64>::deserialize(deserializer)?;
            Ok(raw.into_iter().map(Duration::from_nanos).collect())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1Balance {
    pub uuid: String,
    pub id: String,
    pub value: f64,
    pub expiration_date: Option<DateTime<Utc>>,
    pub weight: f64,
    /// `;`-separated destination ids.
    pub destination_ids: String,
    pub rating_subject: String,
    pub category: String,
    pub shared_group: String,
    pub timings: Vec<RITiming>,
    /// `;`-separated timing ids.
    pub timing_ids: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1UnitsCounter {
    pub direction: String,
    pub balance_type: String,
    pub balances: Vec<V1Balance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1ActionTrigger {
    pub id: String,
    pub threshold_type: String,
    pub threshold_value: f64,
    pub recurrent: bool,
    #[serde(with = "nanos")]
    pub min_sleep: Duration,
    pub expiration_date: Option<DateTime<Utc>>,
    pub activation_date: Option<DateTime<Utc>>,
    pub balance_id: String,
    pub balance_type: String,
    pub balance_direction: String,
    pub balance_destination_ids: String,
    pub balance_weight: f64,
    pub balance_expiration_date: Option<DateTime<Utc>>,
    pub balance_timing_tags: String,
    pub balance_rating_subject: String,
    pub balance_category: String,
    pub balance_shared_group: String,
    pub balance_disabled: bool,
    pub balance_timings: Vec<RITiming>,
    pub weight: f64,
    pub actions_id: String,
    pub min_queued_items: u32,
    pub executed: bool,
    pub last_execution_time: Option<DateTime<Utc>>,
}

/// Balance chains are keyed `*<type>*<direction>`, e.g. `*voice*out`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1Account {
    /// `<direction>:<tenant>:<account>`
    pub id: String,
    pub balance_map: BTreeMap<String, Vec<V1Balance>>,
    pub unit_counters: Vec<V1UnitsCounter>,
    pub action_triggers: Vec<V1ActionTrigger>,
    pub allow_negative: bool,
    pub disabled: bool,
}

/// One entry of a legacy action plan; entries sharing an id form one plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1ActionPlan {
    pub uuid: String,
    pub id: String,
    pub account_ids: Vec<String>,
    pub timing: Option<RateInterval>,
    pub weight: f64,
    pub actions_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1Action {
    pub id: String,
    pub action_type: String,
    pub balance_type: String,
    /// `INBOUND` / `OUTBOUND`; dropped on migration.
    pub direction: String,
    pub extra_parameters: String,
    pub expiration_string: String,
    pub weight: f64,
    pub balance: Option<V1Balance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1SharedGroup {
    pub id: String,
    pub account_parameters: BTreeMap<String, SharingParameters>,
    pub member_ids: Vec<String>,
}

/// The monolithic statistics config. Every criteria list is optional;
/// only the first element of a range list was ever evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct V1Stat {
    pub id: String,
    pub queue_length: usize,
    #[serde(with = "nanos")]
    pub time_window: Duration,
    #[serde(with = "nanos")]
    pub save_interval: Duration,
    pub metrics: Vec<String>,
    pub setup_interval: Vec<DateTime<Utc>>,
    pub tor: Vec<String>,
    pub cdr_host: Vec<String>,
    pub cdr_source: Vec<String>,
    pub req_type: Vec<String>,
    pub direction: Vec<String>,
    pub tenant: Vec<String>,
    pub category: Vec<String>,
    pub account: Vec<String>,
    pub subject: Vec<String>,
    pub destination_ids: Vec<String>,
    #[serde(with = "nanos::list")]
    pub usage_interval: Vec<Duration>,
    #[serde(with = "nanos::list")]
    pub pdd_interval: Vec<Duration>,
    pub supplier: Vec<String>,
    pub disconnect_cause: Vec<String>,
    pub mediation_run_ids: Vec<String>,
    pub rated_account: Vec<String>,
    pub rated_subject: Vec<String>,
    pub cost_interval: Vec<f64>,
    pub triggers: Vec<V1ActionTrigger>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_are_nanoseconds() {
        let stat = V1Stat {
            id: "s".into(),
            time_window: Duration::from_secs(1),
            usage_interval: vec![Duration::from_millis(1500)],
            ..Default::default()
        };
        let json = serde_json::to_value(&stat).unwrap();
        assert_eq!(json["time_window"], 1_000_000_000u64);
        assert_eq!(json["usage_interval"][0], 1_500_000_000u64);

        let back: V1Stat = serde_json::from_value(json).unwrap();
        assert_eq!(back, stat);
    }

    #[test]
    fn test_sparse_records_decode() {
        let acc: V1Account =
            serde_json::from_str(r#"{"id":"*OUT:CUSTOMER_1:rif","balance_map":{"*voice*out":[{"value":10}]}}"#)
                .unwrap();
        assert_eq!(acc.balance_map["*voice*out"][0].value, 10.0);
        assert!(acc.unit_counters.is_empty());
    }
}
