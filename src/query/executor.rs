//! Data source interface

use super::{QueryResponse, SubQuery};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Executes queries against an external data source.
///
/// Implementations are invoked concurrently from many tasks. A task whose
/// query times out is aborted, which drops the in-flight `execute` future;
/// work an implementation hands to `spawn_blocking` or a remote server is not
/// stopped by that and may finish in the background.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute one grouped query
    async fn execute(&self, query: &SubQuery) -> Result<QueryResponse>;

    /// Latest timestamp for which the dataset has data
    async fn max_data_time(&self, dataset: &str) -> Result<DateTime<Utc>>;
}
