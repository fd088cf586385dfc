// SPDX-License-Identifier: PMPL-1.0-or-later
//! Record key layout.
//!
//! Legacy and current records use the same family-prefixed keys; the
//! namespace of the wrapping `TypedStore` keeps them apart.

/// Namespace of legacy (pre-migration) records.
pub const LEGACY_NAMESPACE: &str = "v1";
/// Namespace of current records.
pub const DATA_NAMESPACE: &str = "data";

pub const ACCOUNT_PREFIX: &str = "acc_";
pub const ACTION_PLAN_PREFIX: &str = "apl_";
pub const ACTION_TRIGGER_PREFIX: &str = "atr_";
pub const ACTION_PREFIX: &str = "act_";
pub const SHARED_GROUP_PREFIX: &str = "shg_";
/// Legacy stats configurations; there is no current counterpart.
pub const CDR_STATS_PREFIX: &str = "cst_";
pub const FILTER_PREFIX: &str = "ftr_";
pub const STAT_QUEUE_PROFILE_PREFIX: &str = "sqp_";
pub const STAT_QUEUE_PREFIX: &str = "stq_";

/// Key of the version stamp in the current namespace.
pub const VERSIONS_KEY: &str = "versions";

pub fn account(id: &str) -> String {
    format!("{ACCOUNT_PREFIX}{id}")
}

pub fn action_plan(id: &str) -> String {
    format!("{ACTION_PLAN_PREFIX}{id}")
}

pub fn action_triggers(id: &str) -> String {
    format!("{ACTION_TRIGGER_PREFIX}{id}")
}

pub fn actions(id: &str) -> String {
    format!("{ACTION_PREFIX}{id}")
}

pub fn shared_group(id: &str) -> String {
    format!("{SHARED_GROUP_PREFIX}{id}")
}

pub fn cdr_stats(id: &str) -> String {
    format!("{CDR_STATS_PREFIX}{id}")
}

pub fn filter(tenant: &str, id: &str) -> String {
    format!("{FILTER_PREFIX}{tenant}:{id}")
}

pub fn stat_queue_profile(tenant: &str, id: &str) -> String {
    format!("{STAT_QUEUE_PROFILE_PREFIX}{tenant}:{id}")
}

pub fn stat_queue(tenant: &str, id: &str) -> String {
    format!("{STAT_QUEUE_PREFIX}{tenant}:{id}")
}

/// Strip `prefix` from a scanned key, yielding the record id.
pub fn id_from_key<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    key.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(account("CUSTOMER_1:rif"), "acc_CUSTOMER_1:rif");
        assert_eq!(filter("billstore.org", "test"), "ftr_billstore.org:test");
        assert_eq!(stat_queue("t", "q"), "stq_t:q");
        assert_eq!(id_from_key("apl_PLAN_1", ACTION_PLAN_PREFIX), Some("PLAN_1"));
        assert_eq!(id_from_key("acc_1", ACTION_PLAN_PREFIX), None);
    }
}
