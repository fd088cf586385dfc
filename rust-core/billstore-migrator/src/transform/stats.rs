// SPDX-License-Identifier: PMPL-1.0-or-later
//! Legacy stats config -> Filter + StatQueueProfile + StatQueue.

use billstore_engine::model::{
    Filter, RequestFilter, StatQueue, StatQueueProfile, META_DESTINATIONS, META_GREATER_OR_EQUAL,
    META_STRING_PREFIX,
};

use super::duration::go_duration;
use super::{TransformContext, TransformError, TransformResult};
use crate::legacy::V1Stat;

/// `ASR` -> `*asr`; already canonical ids are kept.
fn canonical_metric(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower.starts_with('*') {
        lower
    } else {
        format!("*{lower}")
    }
}

/// Canonical metric ids in first-seen order, each listed once.
fn canonical_metrics(raw: &[String]) -> Vec<String> {
    let mut metrics: Vec<String> = Vec::with_capacity(raw.len());
    for metric in raw.iter().map(|m| canonical_metric(m)) {
        if !metrics.contains(&metric) {
            metrics.push(metric);
        }
    }
    metrics
}

fn push_filter(
    filters: &mut Vec<RequestFilter>,
    filter_type: &str,
    field: &str,
    values: Vec<String>,
) -> TransformResult<()> {
    if values.is_empty() {
        return Ok(());
    }
    filters.push(RequestFilter::new(filter_type, field, values)?);
    Ok(())
}

/// Only the first element of a range list was ever evaluated, so it alone
/// becomes the `*gte` bound.
fn range_filter<T>(
    filters: &mut Vec<RequestFilter>,
    field: &str,
    values: &[T],
    render: impl Fn(&T) -> String,
) -> TransformResult<()> {
    let first = values.first().map(|v| vec![render(v)]).unwrap_or_default();
    push_filter(filters, META_GREATER_OR_EQUAL, field, first)
}

fn request_filters(legacy: &V1Stat) -> TransformResult<Vec<RequestFilter>> {
    let mut filters = Vec::new();

    range_filter(&mut filters, "SetupInterval", &legacy.setup_interval, |t| t.to_rfc3339())?;

    let string_criteria: [(&str, &Vec<String>); 9] = [
        ("TOR", &legacy.tor),
        ("CdrHost", &legacy.cdr_host),
        ("CdrSource", &legacy.cdr_source),
        ("ReqType", &legacy.req_type),
        ("Direction", &legacy.direction),
        ("Tenant", &legacy.tenant),
        ("Category", &legacy.category),
        ("Account", &legacy.account),
        ("Subject", &legacy.subject),
    ];
    for (field, values) in string_criteria {
        push_filter(&mut filters, META_STRING_PREFIX, field, values.clone())?;
    }

    push_filter(
        &mut filters,
        META_DESTINATIONS,
        "Destination",
        legacy.destination_ids.clone(),
    )?;

    range_filter(&mut filters, "UsageInterval", &legacy.usage_interval, |d| go_duration(*d))?;
    range_filter(&mut filters, "PddInterval", &legacy.pdd_interval, |d| go_duration(*d))?;

    let more_criteria: [(&str, &Vec<String>); 5] = [
        ("Supplier", &legacy.supplier),
        ("DisconnectCause", &legacy.disconnect_cause),
        ("MediationRunIds", &legacy.mediation_run_ids),
        ("RatedAccount", &legacy.rated_account),
        ("RatedSubject", &legacy.rated_subject),
    ];
    for (field, values) in more_criteria {
        push_filter(&mut filters, META_STRING_PREFIX, field, values.clone())?;
    }

    range_filter(&mut filters, "CostInterval", &legacy.cost_interval, |c| c.to_string())?;

    Ok(filters)
}

/// Split one legacy stats config into its three current entities. All of
/// them carry the configured tenant and the legacy id.
pub fn transform_stats(
    ctx: &TransformContext,
    legacy: V1Stat,
) -> TransformResult<(Filter, StatQueueProfile, StatQueue)> {
    if legacy.id.is_empty() {
        return Err(TransformError::MissingId("stats config"));
    }

    let filter = Filter {
        tenant: ctx.tenant.clone(),
        id: legacy.id.clone(),
        request_filters: request_filters(&legacy)?,
    };

    let profile = StatQueueProfile {
        tenant: ctx.tenant.clone(),
        id: legacy.id.clone(),
        filter_ids: vec![filter.id.clone()],
        queue_length: legacy.queue_length,
        ttl: legacy.time_window,
        metrics: canonical_metrics(&legacy.metrics),
        thresholds: legacy.triggers.iter().map(|t| t.id.clone()).collect(),
        blocker: false,
        stored: !legacy.save_interval.is_zero(),
        weight: 0.0,
        min_items: 0,
    };

    let queue = StatQueue::for_profile(&profile)?;

    Ok((filter, profile, queue))
}
