// SPDX-License-Identifier: PMPL-1.0-or-later

use billstore_engine::model::{Action, BalanceFilter};
use billstore_engine::StringSet;

use crate::legacy::{V1Action, V1Balance};

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn non_empty_set(raw: &str) -> Option<StringSet> {
    let set = StringSet::parse(raw);
    (!set.is_empty()).then_some(set)
}

fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

/// Filter matching what a legacy embedded balance described. Fields the
/// legacy record left at their zero value stay unset.
pub(crate) fn balance_filter(
    balance: &V1Balance,
    balance_type: &str,
    directions: Option<StringSet>,
) -> BalanceFilter {
    BalanceFilter {
        uuid: non_empty(&balance.uuid),
        id: non_empty(&balance.id),
        balance_type: non_empty(balance_type),
        value: non_zero(balance.value),
        directions,
        expiration_date: balance.expiration_date,
        weight: non_zero(balance.weight),
        destination_ids: non_empty_set(&balance.destination_ids),
        rating_subject: non_empty(&balance.rating_subject),
        categories: non_empty_set(&balance.category),
        shared_groups: non_empty_set(&balance.shared_group),
        timing_ids: non_empty_set(&balance.timing_ids),
        timings: balance.timings.clone(),
        disabled: balance.disabled.then_some(true),
        factor: None,
        blocker: None,
    }
}

/// The legacy direction is dropped; the embedded balance and the action's
/// balance type become a filter.
pub fn transform_action(legacy: V1Action) -> Action {
    let balance = legacy
        .balance
        .as_ref()
        .map(|b| balance_filter(b, &legacy.balance_type, None));
    Action {
        id: legacy.id,
        action_type: legacy.action_type,
        extra_parameters: legacy.extra_parameters,
        filter: String::new(),
        expiration_string: legacy.expiration_string,
        weight: legacy.weight,
        balance,
    }
}
