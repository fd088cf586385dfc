// SPDX-License-Identifier: PMPL-1.0-or-later
//! Legacy-to-current transforms and the registry that picks one per
//! family and backend class.
//!
//! A transform is a pure function from one raw legacy record to the
//! current entities replacing it. Entities produced from the same record
//! reference each other by id only, so each can be stored on its own.

mod accounts;
mod action_plans;
mod action_triggers;
mod actions;
mod duration;
mod shared_groups;
mod stats;

use billstore_engine::model::Entity;
use billstore_engine::{BackendClass, Family};
use serde::de::DeserializeOwned;

pub use crate::error::TransformError;

pub use accounts::{current_account_id, transform_account};
pub use action_plans::transform_action_plans;
pub use action_triggers::{legacy_threshold_type, transform_action_trigger};
pub use actions::transform_action;
pub use duration::go_duration;
pub use shared_groups::transform_shared_group;
pub use stats::transform_stats;

/// Settings a transform may need beyond the record itself.
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub tenant: String,
}

pub type TransformResult<T> = Result<T, TransformError>;

/// Entry point registered per family: record key, stored bytes, entities.
pub type TransformFn = fn(&TransformContext, &str, &[u8]) -> TransformResult<Vec<Entity>>;

/// The transform for `family` on `class`, if one exists.
///
/// Detail stores hold only cost details, and cost details have no
/// transform yet. Combined stores keep triggers embedded in accounts.
pub fn lookup(family: Family, class: BackendClass) -> Option<TransformFn> {
    use BackendClass::{Combined, Keyed};

    let transform: TransformFn = match (family, class) {
        (Family::Accounts, Keyed | Combined) => migrate_accounts,
        (Family::ActionPlans, Keyed | Combined) => migrate_action_plans,
        (Family::ActionTriggers, Keyed) => migrate_action_triggers,
        (Family::Actions, Keyed | Combined) => migrate_actions,
        (Family::SharedGroups, Keyed | Combined) => migrate_shared_groups,
        (Family::Stats, Keyed | Combined) => migrate_stats,
        _ => return None,
    };
    Some(transform)
}

fn decode<T: DeserializeOwned>(raw: &[u8]) -> TransformResult<T> {
    Ok(serde_json::from_slice(raw)?)
}

/// Id of a list record, taken from its key (`act_<id>` -> `<id>`).
fn list_id<'a>(key: &'a str, prefix: &str) -> &'a str {
    billstore_engine::keys::id_from_key(key, prefix).unwrap_or(key)
}

fn migrate_accounts(
    ctx: &TransformContext,
    _key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    let account = transform_account(ctx, decode(raw)?)?;
    Ok(vec![Entity::Account(account)])
}

fn migrate_action_plans(
    _ctx: &TransformContext,
    _key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    let plans = transform_action_plans(decode(raw)?)?;
    Ok(plans.into_iter().map(Entity::ActionPlan).collect())
}

fn migrate_action_triggers(
    _ctx: &TransformContext,
    key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    let legacy: Vec<crate::legacy::V1ActionTrigger> = decode(raw)?;
    let triggers = legacy
        .into_iter()
        .map(transform_action_trigger)
        .collect::<TransformResult<Vec<_>>>()?;
    let id = list_id(key, billstore_engine::keys::ACTION_TRIGGER_PREFIX).to_string();
    Ok(vec![Entity::ActionTriggers { id, triggers }])
}

fn migrate_actions(
    _ctx: &TransformContext,
    key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    let legacy: Vec<crate::legacy::V1Action> = decode(raw)?;
    let actions = legacy.into_iter().map(transform_action).collect();
    let id = list_id(key, billstore_engine::keys::ACTION_PREFIX).to_string();
    Ok(vec![Entity::Actions { id, actions }])
}

fn migrate_shared_groups(
    _ctx: &TransformContext,
    _key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    Ok(vec![Entity::SharedGroup(transform_shared_group(decode(raw)?))])
}

fn migrate_stats(
    ctx: &TransformContext,
    _key: &str,
    raw: &[u8],
) -> TransformResult<Vec<Entity>> {
    let (filter, profile, queue) = transform_stats(ctx, decode(raw)?)?;
    Ok(vec![
        Entity::Filter(filter),
        Entity::StatQueueProfile(profile),
        Entity::StatQueue(queue),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_coverage() {
        for family in Family::ALL {
            assert!(lookup(family, BackendClass::Detail).is_none());
        }
        assert!(lookup(Family::CostDetails, BackendClass::Keyed).is_none());
        assert!(lookup(Family::CostDetails, BackendClass::Combined).is_none());
        assert!(lookup(Family::ActionTriggers, BackendClass::Combined).is_none());
        assert!(lookup(Family::ActionTriggers, BackendClass::Keyed).is_some());
        assert!(lookup(Family::Stats, BackendClass::Combined).is_some());
    }

    #[test]
    fn test_undecodable_record_is_a_transform_error() {
        let ctx = TransformContext { tenant: "t".into() };
        let transform = lookup(Family::SharedGroups, BackendClass::Keyed).unwrap();

        let err = transform(&ctx, "shg_G", br#"{"member_ids": 5}"#).unwrap_err();
        assert!(matches!(err, TransformError::Unreadable(_)));

        let err = transform(&ctx, "shg_G", b"\xff not json").unwrap_err();
        assert!(matches!(err, TransformError::Unreadable(_)));
    }

    #[test]
    fn test_list_records_take_id_from_key() {
        let ctx = TransformContext { tenant: "t".into() };
        let transform = lookup(Family::Actions, BackendClass::Keyed).unwrap();
        let entities = transform(&ctx, "act_TOPUP", br#"[{"id": "TOPUP"}]"#).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].key(), "act_TOPUP");
    }
}
