//! Fixture-backed data source
//!
//! Answers filter queries from a static JSON snapshot. Used by the CLI for
//! offline runs and by tests; per-dimension latency, failures and hangs can be
//! injected to exercise degraded lookups.

use super::{QueryExecutor, QueryResponse, ResponseRow, SubQuery};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Fixture rows for every dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSet {
    pub datasets: HashMap<String, DatasetFixture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFixture {
    /// Reported latest data time; absent means the lookup fails
    #[serde(default)]
    pub max_data_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dimensions: HashMap<String, DimensionFixture>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionFixture {
    /// Raw group-by values, returned as-is
    #[serde(default)]
    pub values: Vec<String>,
    /// Latency injected before answering
    #[serde(default)]
    pub delay_ms: u64,
    /// Fail the query with this message
    #[serde(default)]
    pub error: Option<String>,
    /// Never answer
    #[serde(default)]
    pub hang: bool,
}

impl DimensionFixture {
    pub fn values(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Query executor answering from a [`FixtureSet`]
#[derive(Debug, Clone, Default)]
pub struct StaticQueryExecutor {
    fixtures: FixtureSet,
}

impl StaticQueryExecutor {
    pub fn new(fixtures: FixtureSet) -> Self {
        Self { fixtures }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let fixtures: FixtureSet = serde_json::from_str(&raw)?;
        Ok(Self::new(fixtures))
    }

    fn dataset(&self, dataset: &str) -> Result<&DatasetFixture> {
        self.fixtures
            .datasets
            .get(dataset)
            .ok_or_else(|| Error::Query(format!("no fixture for dataset '{}'", dataset)))
    }
}

#[async_trait]
impl QueryExecutor for StaticQueryExecutor {
    async fn execute(&self, query: &SubQuery) -> Result<QueryResponse> {
        let dataset = query
            .dataset()
            .ok_or_else(|| Error::Query("query has no metric function".to_string()))?;
        let fixture = self.dataset(dataset)?.dimensions.get(&query.group_by).ok_or_else(|| {
            Error::Query(format!(
                "no fixture for dimension '{}' of dataset '{}'",
                query.group_by, dataset
            ))
        })?;

        if fixture.hang {
            debug!("Fixture for {}.{} never answers", dataset, query.group_by);
            std::future::pending::<()>().await;
        }
        if fixture.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(fixture.delay_ms)).await;
        }
        if let Some(message) = &fixture.error {
            return Err(Error::Query(message.clone()));
        }

        let mut response = QueryResponse::new();
        for metric in &query.metric_functions {
            for value in &fixture.values {
                response.push_row(metric, ResponseRow::new(&query.group_by, value, 1.0));
            }
        }
        Ok(response)
    }

    async fn max_data_time(&self, dataset: &str) -> Result<DateTime<Utc>> {
        self.dataset(dataset)?
            .max_data_time
            .ok_or_else(|| Error::Query(format!("max data time unavailable for '{}'", dataset)))
    }
}
