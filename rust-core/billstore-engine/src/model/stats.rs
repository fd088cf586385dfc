// SPDX-License-Identifier: PMPL-1.0-or-later
//! Request filters, stat queue profiles and live stat queues.
//!
//! A stat queue profile names its filters and thresholds by id only; the
//! queue holds one accumulator per profile metric. All three are stored
//! independently under `<tenant>:<id>` keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::sets::StringSet;

pub const META_STRING: &str = "*string";
pub const META_STRING_PREFIX: &str = "*string_prefix";
pub const META_DESTINATIONS: &str = "*destinations";
pub const META_GREATER_THAN: &str = "*gt";
pub const META_GREATER_OR_EQUAL: &str = "*gte";
pub const META_LESS_THAN: &str = "*lt";
pub const META_LESS_OR_EQUAL: &str = "*lte";

const FILTER_TYPES: [&str; 7] = [
    META_STRING,
    META_STRING_PREFIX,
    META_DESTINATIONS,
    META_GREATER_THAN,
    META_GREATER_OR_EQUAL,
    META_LESS_THAN,
    META_LESS_OR_EQUAL,
];

/// One predicate of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub filter_type: String,
    pub field_name: String,
    pub values: Vec<String>,
}

impl RequestFilter {
    /// Build a predicate, rejecting unknown operators, a missing field name
    /// and an empty value list.
    pub fn new(
        filter_type: &str,
        field_name: &str,
        values: Vec<String>,
    ) -> Result<Self, EngineError> {
        if !FILTER_TYPES.contains(&filter_type) {
            return Err(EngineError::InvalidFilter(format!(
                "unsupported filter type {filter_type}"
            )));
        }
        if field_name.is_empty() {
            return Err(EngineError::InvalidFilter(format!(
                "{filter_type} requires a field name"
            )));
        }
        if values.is_empty() {
            return Err(EngineError::InvalidFilter(format!(
                "{filter_type} on {field_name} requires at least one value"
            )));
        }
        Ok(Self {
            filter_type: filter_type.to_string(),
            field_name: field_name.to_string(),
            values,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    pub tenant: String,
    pub id: String,
    pub request_filters: Vec<RequestFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatQueueProfile {
    pub tenant: String,
    pub id: String,
    pub filter_ids: Vec<String>,
    pub queue_length: usize,
    pub ttl: Duration,
    pub metrics: Vec<String>,
    /// Ids of the thresholds notified on every update.
    pub thresholds: Vec<String>,
    pub blocker: bool,
    pub stored: bool,
    pub weight: f64,
    pub min_items: usize,
}

/// Supported metric kinds, named by their canonical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Answer-seizure ratio.
    #[serde(rename = "*asr")]
    Asr,
    /// Average call duration.
    #[serde(rename = "*acd")]
    Acd,
    /// Total call duration.
    #[serde(rename = "*tcd")]
    Tcd,
    /// Average call cost.
    #[serde(rename = "*acc")]
    Acc,
    /// Total call cost.
    #[serde(rename = "*tcc")]
    Tcc,
    /// Post-dial delay.
    #[serde(rename = "*pdd")]
    Pdd,
    /// Distinct destination count.
    #[serde(rename = "*ddc")]
    Ddc,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Asr,
        MetricKind::Acd,
        MetricKind::Tcd,
        MetricKind::Acc,
        MetricKind::Tcc,
        MetricKind::Pdd,
        MetricKind::Ddc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Asr => "*asr",
            MetricKind::Acd => "*acd",
            MetricKind::Tcd => "*tcd",
            MetricKind::Acc => "*acc",
            MetricKind::Tcc => "*tcc",
            MetricKind::Pdd => "*pdd",
            MetricKind::Ddc => "*ddc",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EngineError::UnknownMetric(s.to_string()))
    }
}

/// Running accumulator for one metric of a stat queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatMetric {
    pub kind: MetricKind,
    pub min_items: usize,
    /// Events seen.
    pub count: u64,
    /// Events that contributed to `sum` (answered calls for ASR).
    pub hits: u64,
    pub sum: f64,
    /// Distinct destinations, only used by `*ddc`.
    #[serde(default, skip_serializing_if = "StringSet::is_empty")]
    pub destinations: StringSet,
}

impl StatMetric {
    /// A zeroed accumulator for the metric named by `metric_id`.
    pub fn new(metric_id: &str, min_items: usize) -> Result<Self, EngineError> {
        Ok(Self {
            kind: metric_id.parse()?,
            min_items,
            count: 0,
            hits: 0,
            sum: 0.0,
            destinations: StringSet::new(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatQueue {
    pub tenant: String,
    pub id: String,
    pub sq_metrics: BTreeMap<String, StatMetric>,
}

impl StatQueue {
    /// A queue with one zeroed accumulator per profile metric.
    pub fn for_profile(profile: &StatQueueProfile) -> Result<Self, EngineError> {
        let mut sq_metrics = BTreeMap::new();
        for metric_id in &profile.metrics {
            sq_metrics.insert(
                metric_id.clone(),
                StatMetric::new(metric_id, profile.min_items)?,
            );
        }
        Ok(Self {
            tenant: profile.tenant.clone(),
            id: profile.id.clone(),
            sq_metrics,
        })
    }
}
