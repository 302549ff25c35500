//! Raw outcome to filter value conversion

use super::DimensionFilterMap;
use crate::gather::{DimensionOutcome, QueryOutcome};
use crate::metadata::DatasetDescriptor;
use crate::query::{MetricFunction, QueryResponse};

/// Build the filter map from gathered outcomes.
///
/// Failed and timed-out dimensions map to an empty list. Processing stops at
/// the first interrupted outcome. The time column is never returned.
pub fn post_process(
    outcomes: &[DimensionOutcome],
    descriptor: &DatasetDescriptor,
    metric: &MetricFunction,
) -> DimensionFilterMap {
    let mut filters = DimensionFilterMap::new();

    for DimensionOutcome { dimension, outcome } in outcomes {
        let values = match outcome {
            QueryOutcome::Success(response) => {
                let raw = extract_values(response, metric, dimension);
                clean_values(raw, descriptor, dimension)
            }
            QueryOutcome::ExecutionFailure(_) | QueryOutcome::Timeout(_) => Vec::new(),
            QueryOutcome::Interrupted => break,
        };
        filters.insert(dimension.clone(), values);
    }

    filters.remove(&descriptor.time_column);
    filters
}

/// Group-by values of every row returned for `metric`.
///
/// Rows without a value for `dimension` are skipped.
pub fn extract_values(
    response: &QueryResponse,
    metric: &MetricFunction,
    dimension: &str,
) -> Vec<String> {
    (0..response.num_rows_for(metric))
        .filter_map(|i| response.row(metric, i))
        .filter_map(|row| row.get(dimension))
        .map(str::to_string)
        .collect()
}

/// Strip the pre-aggregation sentinel where the dataset requires it, then
/// sort ordinally (byte-wise, case-sensitive) and drop duplicates.
pub fn clean_values(
    mut values: Vec<String>,
    descriptor: &DatasetDescriptor,
    dimension: &str,
) -> Vec<String> {
    if descriptor.excludes_pre_aggregated(dimension) {
        values.retain(|v| *v != descriptor.pre_aggregated_keyword);
    }
    values.sort();
    values.dedup();
    values
}
