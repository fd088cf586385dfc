// SPDX-License-Identifier: PMPL-1.0-or-later

use billstore_engine::model::{ActionPlan, ActionTiming};
use uuid::Uuid;

use super::accounts::strip_direction;
use super::{TransformError, TransformResult};
use crate::legacy::V1ActionPlan;

/// Stable uuid for the `index`-th timing of `plan_id`, so re-running a
/// migration rewrites identical records.
fn timing_uuid(plan_id: &str, index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{plan_id}/{index}").as_bytes()).to_string()
}

/// Merge legacy entries sharing a plan id into one plan each, in order of
/// first appearance.
pub fn transform_action_plans(legacy: Vec<V1ActionPlan>) -> TransformResult<Vec<ActionPlan>> {
    let mut plans: Vec<ActionPlan> = Vec::new();

    for entry in legacy {
        if entry.id.is_empty() {
            return Err(TransformError::MissingId("action plan entry"));
        }
        let position = match plans.iter().position(|p| p.id == entry.id) {
            Some(position) => position,
            None => {
                plans.push(ActionPlan {
                    id: entry.id.clone(),
                    ..Default::default()
                });
                plans.len() - 1
            }
        };
        let plan = &mut plans[position];

        for account_id in &entry.account_ids {
            plan.account_ids.insert(strip_direction(account_id)?);
        }

        let index = plan.action_timings.len();
        plan.action_timings.push(ActionTiming {
            uuid: timing_uuid(&plan.id, index),
            timing: entry.timing,
            actions_id: entry.actions_id,
            weight: entry.weight,
        });
    }

    Ok(plans)
}
