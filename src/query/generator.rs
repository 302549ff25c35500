//! Sub-query generation

use super::{MetricFunction, SubQuery};
use chrono::{DateTime, Utc};

/// Request reference attached to every filter lookup query
pub const FILTERS_REQUEST_REFERENCE: &str = "filters";

/// Build one grouped query per dimension, preserving input order.
///
/// Callers must pass a non-empty `data_source`.
pub fn build_queries(
    metric: &MetricFunction,
    dimensions: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    data_source: &str,
) -> Vec<SubQuery> {
    dimensions
        .iter()
        .map(|dimension| SubQuery {
            metric_functions: vec![metric.clone()],
            group_by: dimension.clone(),
            start_inclusive: start,
            end_exclusive: end,
            data_source: data_source.to_string(),
            request_reference: FILTERS_REQUEST_REFERENCE.to_string(),
        })
        .collect()
}
