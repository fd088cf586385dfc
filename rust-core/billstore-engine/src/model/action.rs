// SPDX-License-Identifier: PMPL-1.0-or-later
//! Actions, action plans and action triggers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::balance_filter::{BalanceFilter, RateInterval};
use crate::error::EngineError;
use crate::sets::StringSet;

/// What a trigger compares its threshold against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdType {
    #[serde(rename = "*min_event_counter")]
    MinEventCounter,
    #[serde(rename = "*max_event_counter")]
    MaxEventCounter,
    #[serde(rename = "*min_balance_counter")]
    MinBalanceCounter,
    #[serde(rename = "*max_balance_counter")]
    MaxBalanceCounter,
    #[serde(rename = "*min_balance")]
    MinBalance,
    #[serde(rename = "*max_balance")]
    MaxBalance,
    #[serde(rename = "*balance_expired")]
    BalanceExpired,
}

impl ThresholdType {
    pub const ALL: [ThresholdType; 7] = [
        ThresholdType::MinEventCounter,
        ThresholdType::MaxEventCounter,
        ThresholdType::MinBalanceCounter,
        ThresholdType::MaxBalanceCounter,
        ThresholdType::MinBalance,
        ThresholdType::MaxBalance,
        ThresholdType::BalanceExpired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdType::MinEventCounter => "*min_event_counter",
            ThresholdType::MaxEventCounter => "*max_event_counter",
            ThresholdType::MinBalanceCounter => "*min_balance_counter",
            ThresholdType::MaxBalanceCounter => "*max_balance_counter",
            ThresholdType::MinBalance => "*min_balance",
            ThresholdType::MaxBalance => "*max_balance",
            ThresholdType::BalanceExpired => "*balance_expired",
        }
    }

}

impl fmt::Display for ThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngineError::UnknownThresholdType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrigger {
    pub id: String,
    #[serde(default)]
    pub unique_id: String,
    pub threshold_type: ThresholdType,
    #[serde(default)]
    pub threshold_value: f64,
    #[serde(default)]
    pub recurrent: bool,
    #[serde(default)]
    pub min_sleep: Duration,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub balance: Option<BalanceFilter>,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub actions_id: String,
    #[serde(default)]
    pub min_queued_items: u32,
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub last_execution_time: Option<DateTime<Utc>>,
}

impl ActionTrigger {
    pub fn new(id: impl Into<String>, threshold_type: ThresholdType, threshold_value: f64) -> Self {
        Self {
            id: id.into(),
            unique_id: String::new(),
            threshold_type,
            threshold_value,
            recurrent: false,
            min_sleep: Duration::ZERO,
            expiration_date: None,
            activation_date: None,
            balance: None,
            weight: 0.0,
            actions_id: String::new(),
            min_queued_items: 0,
            executed: false,
            last_execution_time: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub id: String,
    pub action_type: String,
    pub extra_parameters: String,
    pub filter: String,
    pub expiration_string: String,
    pub weight: f64,
    pub balance: Option<BalanceFilter>,
}

/// One scheduled entry of an action plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTiming {
    pub uuid: String,
    pub timing: Option<RateInterval>,
    pub actions_id: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    pub id: String,
    pub account_ids: StringSet,
    pub action_timings: Vec<ActionTiming>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_type_names() {
        for t in ThresholdType::ALL {
            assert_eq!(t.as_str().parse::<ThresholdType>().unwrap(), t);
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert!(matches!(
            "*min_counter".parse::<ThresholdType>(),
            Err(EngineError::UnknownThresholdType(_))
        ));
    }

    #[test]
    fn test_trigger_defaults() {
        let trigger = ActionTrigger::new("Test", ThresholdType::MaxBalance, 2.0);
        assert!(trigger.balance.is_none());
        assert_eq!(trigger.min_sleep, Duration::ZERO);

        let back: ActionTrigger =
            serde_json::from_str(r#"{"id":"Test","threshold_type":"*max_balance"}"#).unwrap();
        assert_eq!(back.threshold_value, 0.0);
        assert_eq!(back.threshold_type, ThresholdType::MaxBalance);
    }
}
