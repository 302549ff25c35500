//! Query model for dimension filter lookups
//!
//! A filter lookup issues one grouped `COUNT(*)` query per dimension. This
//! module holds the query value objects, the generator that builds them, and
//! the executor interface the data source implements.

mod executor;
mod fixture;
mod generator;

pub use executor::QueryExecutor;
pub use fixture::{DatasetFixture, DimensionFixture, FixtureSet, StaticQueryExecutor};
pub use generator::{build_queries, FILTERS_REQUEST_REFERENCE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Aggregation applied to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunction {
    Sum,
    Avg,
    Count,
    Max,
}

impl AggFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Max => "MAX",
        }
    }
}

/// Metric name that stands for "every row"
pub const STAR_METRIC: &str = "*";

/// An aggregation over one metric of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricFunction {
    pub function: AggFunction,
    pub metric_name: String,
    pub metric_id: Option<i64>,
    pub dataset: String,
}

impl MetricFunction {
    pub fn new(function: AggFunction, metric_name: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            function,
            metric_name: metric_name.into(),
            metric_id: None,
            dataset: dataset.into(),
        }
    }

    /// `COUNT(*)` over a dataset, the metric used for filter lookups
    pub fn count_star(dataset: impl Into<String>) -> Self {
        Self::new(AggFunction::Count, STAR_METRIC, dataset)
    }

    pub fn with_metric_id(mut self, metric_id: i64) -> Self {
        self.metric_id = Some(metric_id);
        self
    }
}

impl fmt::Display for MetricFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function.as_str(), self.metric_name)
    }
}

/// One grouped query against the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    pub metric_functions: Vec<MetricFunction>,
    /// The single group-by dimension
    pub group_by: String,
    pub start_inclusive: DateTime<Utc>,
    pub end_exclusive: DateTime<Utc>,
    pub data_source: String,
    pub request_reference: String,
}

impl SubQuery {
    /// Dimension this query groups by
    pub fn dimension(&self) -> &str {
        &self.group_by
    }

    /// Dataset targeted by the first metric function
    pub fn dataset(&self) -> Option<&str> {
        self.metric_functions.first().map(|m| m.dataset.as_str())
    }
}

/// One result row: group-by values plus the aggregated metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRow {
    pub dimensions: BTreeMap<String, String>,
    pub value: f64,
}

impl ResponseRow {
    pub fn new(dimension: impl Into<String>, dimension_value: impl Into<String>, value: f64) -> Self {
        let mut dimensions = BTreeMap::new();
        dimensions.insert(dimension.into(), dimension_value.into());
        Self { dimensions, value }
    }

    pub fn get(&self, dimension: &str) -> Option<&str> {
        self.dimensions.get(dimension).map(String::as_str)
    }
}

/// Rows returned by the data source, grouped by metric function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    rows: HashMap<MetricFunction, Vec<ResponseRow>>,
}

impl QueryResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, metric: MetricFunction, rows: Vec<ResponseRow>) -> Self {
        self.rows.entry(metric).or_default().extend(rows);
        self
    }

    pub fn push_row(&mut self, metric: &MetricFunction, row: ResponseRow) {
        self.rows.entry(metric.clone()).or_default().push(row);
    }

    /// Number of rows returned for a metric function
    pub fn num_rows_for(&self, metric: &MetricFunction) -> usize {
        self.rows.get(metric).map_or(0, Vec::len)
    }

    pub fn row(&self, metric: &MetricFunction, index: usize) -> Option<&ResponseRow> {
        self.rows.get(metric).and_then(|rows| rows.get(index))
    }
}
