// SPDX-License-Identifier: PMPL-1.0-or-later
//! Current-shape billing entities.

mod account;
mod action;
mod balance_filter;
mod shared_group;
mod stats;

pub use account::{Account, Balance, CounterFilter, UnitCounter};
pub use action::{Action, ActionPlan, ActionTiming, ActionTrigger, ThresholdType};
pub use balance_filter::{BalanceFilter, RITiming, RateInterval, ValueFactor};
pub use shared_group::{SharedGroup, SharingParameters};
pub use stats::{
    Filter, MetricKind, RequestFilter, StatMetric, StatQueue, StatQueueProfile,
    META_DESTINATIONS, META_GREATER_OR_EQUAL, META_GREATER_THAN, META_LESS_OR_EQUAL,
    META_LESS_THAN, META_STRING, META_STRING_PREFIX,
};

use serde::{Deserialize, Serialize};

use crate::keys;
use crate::sets::StringSet;

/// Balance direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "*out")]
    Out,
    #[serde(rename = "*in")]
    In,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Out => "*out",
            Direction::In => "*in",
        }
    }

    /// Read any of the historical spellings (`*in`, `*IN`, `IN`,
    /// `INBOUND`). Everything else, including empty, is outbound.
    pub fn from_legacy(raw: &str) -> Self {
        match raw.trim().trim_start_matches('*').to_ascii_uppercase().as_str() {
            "IN" | "INBOUND" => Direction::In,
            _ => Direction::Out,
        }
    }

    /// Singleton direction set for a legacy direction string.
    pub fn legacy_set(raw: Option<&str>) -> StringSet {
        StringSet::singleton(raw.map(Self::from_legacy).unwrap_or_default().as_str())
    }
}

/// Any current-shape record, ready to be written under its own key.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Account(Account),
    ActionPlan(ActionPlan),
    ActionTriggers { id: String, triggers: Vec<ActionTrigger> },
    Actions { id: String, actions: Vec<Action> },
    SharedGroup(SharedGroup),
    Filter(Filter),
    StatQueueProfile(StatQueueProfile),
    StatQueue(StatQueue),
}

impl Entity {
    /// Key of the record in the current namespace.
    pub fn key(&self) -> String {
        match self {
            Entity::Account(a) => keys::account(&a.id),
            Entity::ActionPlan(p) => keys::action_plan(&p.id),
            Entity::ActionTriggers { id, .. } => keys::action_triggers(id),
            Entity::Actions { id, .. } => keys::actions(id),
            Entity::SharedGroup(g) => keys::shared_group(&g.id),
            Entity::Filter(f) => keys::filter(&f.tenant, &f.id),
            Entity::StatQueueProfile(p) => keys::stat_queue_profile(&p.tenant, &p.id),
            Entity::StatQueue(q) => keys::stat_queue(&q.tenant, &q.id),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Entity::Account(a) => serde_json::to_value(a),
            Entity::ActionPlan(p) => serde_json::to_value(p),
            Entity::ActionTriggers { triggers, .. } => serde_json::to_value(triggers),
            Entity::Actions { actions, .. } => serde_json::to_value(actions),
            Entity::SharedGroup(g) => serde_json::to_value(g),
            Entity::Filter(f) => serde_json::to_value(f),
            Entity::StatQueueProfile(p) => serde_json::to_value(p),
            Entity::StatQueue(q) => serde_json::to_value(q),
        }
    }
}
