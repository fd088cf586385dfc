// SPDX-License-Identifier: PMPL-1.0-or-later

use std::collections::BTreeMap;

use billstore_engine::model::{
    Account, Balance, CounterFilter, Direction, UnitCounter, ValueFactor,
};
use billstore_engine::StringSet;

use super::action_triggers::transform_action_trigger;
use super::actions::balance_filter;
use super::{TransformContext, TransformError, TransformResult};
use crate::legacy::{V1Account, V1Balance, V1UnitsCounter};

/// `*OUT:CUSTOMER_1:rif` -> `CUSTOMER_1:rif`. Two-segment ids are
/// already current; anything else is malformed.
pub fn current_account_id(legacy_id: &str) -> TransformResult<String> {
    if legacy_id.split(':').count() < 2 {
        return Err(TransformError::MalformedAccountId(legacy_id.to_string()));
    }
    strip_direction(legacy_id)
}

/// Drop the direction segment of a three-segment id. Bare and two-segment
/// ids are returned unchanged; ids with empty or extra segments are
/// malformed.
pub(crate) fn strip_direction(legacy_id: &str) -> TransformResult<String> {
    let parts: Vec<&str> = legacy_id.split(':').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(TransformError::MalformedAccountId(legacy_id.to_string()));
    }
    match parts.as_slice() {
        [_direction, tenant, account] => Ok(format!("{tenant}:{account}")),
        [_] | [_, _] => Ok(legacy_id.to_string()),
        _ => Err(TransformError::MalformedAccountId(legacy_id.to_string())),
    }
}

/// Split a balance chain key `*<type>*<direction>` into the balance type
/// and its direction. A key without direction is outbound.
fn split_balance_key(key: &str) -> TransformResult<(String, Direction)> {
    let body = key
        .strip_prefix('*')
        .ok_or_else(|| TransformError::MalformedBalanceKey(key.to_string()))?;
    match body.split_once('*') {
        Some((kind, direction)) if !kind.is_empty() => {
            Ok((format!("*{kind}"), Direction::from_legacy(direction)))
        }
        None if !body.is_empty() => Ok((key.to_string(), Direction::Out)),
        _ => Err(TransformError::MalformedBalanceKey(key.to_string())),
    }
}

fn transform_balance(legacy: V1Balance, direction: Direction) -> Balance {
    Balance {
        uuid: legacy.uuid,
        id: legacy.id,
        value: legacy.value,
        directions: StringSet::singleton(direction.as_str()),
        expiration_date: legacy.expiration_date,
        weight: legacy.weight,
        destination_ids: StringSet::parse(&legacy.destination_ids),
        rating_subject: legacy.rating_subject,
        categories: StringSet::parse(&legacy.category),
        shared_groups: StringSet::parse(&legacy.shared_group),
        timings: legacy.timings,
        timing_ids: StringSet::parse(&legacy.timing_ids),
        disabled: legacy.disabled,
        factor: ValueFactor::default(),
        blocker: false,
    }
}

fn transform_unit_counter(legacy: V1UnitsCounter) -> UnitCounter {
    let directions = Direction::legacy_set(Some(legacy.direction.as_str()));
    let counters = legacy
        .balances
        .iter()
        .map(|balance| CounterFilter {
            value: balance.value,
            filter: Some(balance_filter(
                balance,
                &legacy.balance_type,
                Some(directions.clone()),
            )),
        })
        .collect();
    UnitCounter {
        counter_type: "*event".to_string(),
        counters,
    }
}

pub fn transform_account(_ctx: &TransformContext, legacy: V1Account) -> TransformResult<Account> {
    let id = current_account_id(&legacy.id)?;

    let mut balance_map: BTreeMap<String, Vec<Balance>> = BTreeMap::new();
    for (key, chain) in legacy.balance_map {
        let (balance_type, direction) = split_balance_key(&key)?;
        balance_map
            .entry(balance_type)
            .or_default()
            .extend(chain.into_iter().map(|b| transform_balance(b, direction)));
    }

    let mut unit_counters: BTreeMap<String, Vec<UnitCounter>> = BTreeMap::new();
    for counter in legacy.unit_counters {
        unit_counters
            .entry(counter.balance_type.clone())
            .or_default()
            .push(transform_unit_counter(counter));
    }

    let action_triggers = legacy
        .action_triggers
        .into_iter()
        .map(transform_action_trigger)
        .collect::<TransformResult<Vec<_>>>()?;

    Ok(Account {
        id,
        balance_map,
        unit_counters,
        action_triggers,
        allow_negative: legacy.allow_negative,
        disabled: legacy.disabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::V1ActionTrigger;
    use billstore_engine::model::ThresholdType;

    fn ctx() -> TransformContext {
        TransformContext { tenant: "billstore.org".into() }
    }

    #[test]
    fn test_account_ids() {
        assert_eq!(current_account_id("*OUT:CUSTOMER_1:rif").unwrap(), "CUSTOMER_1:rif");
        assert_eq!(current_account_id("CUSTOMER_1:rif").unwrap(), "CUSTOMER_1:rif");
        for bad in ["rif", "a:b:c:d", "*OUT::rif", ":rif", ""] {
            assert!(
                matches!(current_account_id(bad), Err(TransformError::MalformedAccountId(id)) if id == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_strip_direction_keeps_bare_ids() {
        assert_eq!(strip_direction("one").unwrap(), "one");
        assert_eq!(strip_direction("t:1001").unwrap(), "t:1001");
        assert_eq!(strip_direction("*OUT:t:1001").unwrap(), "t:1001");
        assert!(strip_direction("a:b:c:d").is_err());
        assert!(strip_direction("*OUT::1001").is_err());
    }

    #[test]
    fn test_balance_keys() {
        assert_eq!(
            split_balance_key("*voice*out").unwrap(),
            ("*voice".to_string(), Direction::Out)
        );
        assert_eq!(
            split_balance_key("*sms*in").unwrap(),
            ("*sms".to_string(), Direction::In)
        );
        assert_eq!(
            split_balance_key("*monetary").unwrap(),
            ("*monetary".to_string(), Direction::Out)
        );
        assert!(matches!(
            split_balance_key("monetary"),
            Err(TransformError::MalformedBalanceKey(key)) if key == "monetary"
        ));
        assert!(matches!(
            split_balance_key("**out"),
            Err(TransformError::MalformedBalanceKey(_))
        ));
    }

    #[test]
    fn test_voice_balance_becomes_sets() {
        let mut legacy = V1Account {
            id: "*OUT:CUSTOMER_1:rif".into(),
            ..Default::default()
        };
        legacy.balance_map.insert(
            "*voice*out".into(),
            vec![V1Balance {
                value: 10.0,
                weight: 10.0,
                destination_ids: "NAT".into(),
                ..Default::default()
            }],
        );
        legacy.balance_map.insert(
            "*monetary*out".into(),
            vec![V1Balance { value: 21.0, ..Default::default() }],
        );

        let account = transform_account(&ctx(), legacy).unwrap();
        assert_eq!(account.id, "CUSTOMER_1:rif");

        let voice = &account.balance_map["*voice"][0];
        assert_eq!(voice.value, 10.0);
        assert_eq!(voice.weight, 10.0);
        assert_eq!(voice.destination_ids, StringSet::singleton("NAT"));
        assert_eq!(voice.directions, StringSet::singleton("*out"));
        assert!(voice.categories.is_empty());
        assert!(voice.timing_ids.is_empty());
        assert!(voice.factor.is_empty());

        let monetary = &account.balance_map["*monetary"][0];
        assert_eq!(monetary.value, 21.0);
        assert!(monetary.destination_ids.is_empty());
    }

    #[test]
    fn test_counters_and_triggers() {
        let legacy = V1Account {
            id: "t:1001".into(),
            unit_counters: vec![V1UnitsCounter {
                direction: "*out".into(),
                balance_type: "*voice".into(),
                balances: vec![V1Balance {
                    value: 30.0,
                    destination_ids: "RET".into(),
                    ..Default::default()
                }],
            }],
            action_triggers: vec![V1ActionTrigger {
                id: "T1".into(),
                threshold_type: "*max_counter".into(),
                threshold_value: 60.0,
                ..Default::default()
            }],
            allow_negative: true,
            ..Default::default()
        };

        let account = transform_account(&ctx(), legacy).unwrap();
        let counter = &account.unit_counters["*voice"][0];
        assert_eq!(counter.counters[0].value, 30.0);
        let filter = counter.counters[0].filter.as_ref().unwrap();
        assert_eq!(filter.balance_type.as_deref(), Some("*voice"));
        assert_eq!(filter.destination_ids, Some(StringSet::singleton("RET")));
        assert_eq!(filter.directions, Some(StringSet::singleton("*out")));

        assert_eq!(account.action_triggers[0].threshold_type, ThresholdType::MaxEventCounter);
        assert!(account.allow_negative);
    }

    #[test]
    fn test_bad_trigger_fails_the_account() {
        let legacy = V1Account {
            id: "t:1001".into(),
            action_triggers: vec![V1ActionTrigger {
                id: "T1".into(),
                threshold_type: "*sometimes".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(matches!(
            transform_account(&ctx(), legacy),
            Err(TransformError::UnknownThresholdType { trigger, .. }) if trigger == "T1"
        ));
    }
}
