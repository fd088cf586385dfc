// SPDX-License-Identifier: PMPL-1.0-or-later

use billstore_engine::model::{ActionTrigger, BalanceFilter, Direction, ThresholdType};
use billstore_engine::StringSet;

use super::{TransformError, TransformResult};
use crate::legacy::V1ActionTrigger;

/// Legacy threshold names and their current types. Counter thresholds were
/// renamed once event and balance counters were split.
const LEGACY_THRESHOLD_TYPES: &[(&str, ThresholdType)] = &[
    ("*min_counter", ThresholdType::MinEventCounter),
    ("*max_counter", ThresholdType::MaxEventCounter),
    ("*min_event_counter", ThresholdType::MinEventCounter),
    ("*max_event_counter", ThresholdType::MaxEventCounter),
    ("*min_balance_counter", ThresholdType::MinBalanceCounter),
    ("*max_balance_counter", ThresholdType::MaxBalanceCounter),
    ("*min_balance", ThresholdType::MinBalance),
    ("*max_balance", ThresholdType::MaxBalance),
    ("*balance_expired", ThresholdType::BalanceExpired),
];

pub fn legacy_threshold_type(raw: &str) -> Option<ThresholdType> {
    LEGACY_THRESHOLD_TYPES
        .iter()
        .find(|(name, _)| *name == raw)
        .map(|(_, t)| *t)
}

fn opt_string(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn opt_set(raw: &str) -> Option<StringSet> {
    let set = StringSet::parse(raw);
    (!set.is_empty()).then_some(set)
}

/// Move the balance-matching fields off the trigger into its filter.
fn trigger_filter(legacy: &mut V1ActionTrigger) -> BalanceFilter {
    let direction = std::mem::take(&mut legacy.balance_direction);
    BalanceFilter {
        id: opt_string(std::mem::take(&mut legacy.balance_id)),
        balance_type: opt_string(std::mem::take(&mut legacy.balance_type)),
        directions: (!direction.is_empty())
            .then(|| StringSet::singleton(Direction::from_legacy(&direction).as_str())),
        expiration_date: legacy.balance_expiration_date,
        weight: (legacy.balance_weight != 0.0).then_some(legacy.balance_weight),
        destination_ids: opt_set(&legacy.balance_destination_ids),
        rating_subject: opt_string(std::mem::take(&mut legacy.balance_rating_subject)),
        categories: opt_set(&legacy.balance_category),
        shared_groups: opt_set(&legacy.balance_shared_group),
        timing_ids: opt_set(&legacy.balance_timing_tags),
        timings: std::mem::take(&mut legacy.balance_timings),
        disabled: legacy.balance_disabled.then_some(true),
        ..Default::default()
    }
}

pub fn transform_action_trigger(mut legacy: V1ActionTrigger) -> TransformResult<ActionTrigger> {
    let Some(threshold_type) = legacy_threshold_type(&legacy.threshold_type) else {
        return Err(TransformError::UnknownThresholdType {
            trigger: legacy.id,
            threshold_type: legacy.threshold_type,
        });
    };
    let balance = trigger_filter(&mut legacy);

    Ok(ActionTrigger {
        id: legacy.id,
        unique_id: String::new(),
        threshold_type,
        threshold_value: legacy.threshold_value,
        recurrent: legacy.recurrent,
        min_sleep: legacy.min_sleep,
        expiration_date: legacy.expiration_date,
        activation_date: legacy.activation_date,
        balance: Some(balance),
        weight: legacy.weight,
        actions_id: legacy.actions_id,
        min_queued_items: legacy.min_queued_items,
        executed: legacy.executed,
        last_execution_time: legacy.last_execution_time,
    })
}
