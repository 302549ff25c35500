//! Dimension filter lookups
//!
//! For a dataset, find the known values of each dimension over the most
//! recent window of data. The lookup resolves the dataset descriptor and the
//! query window, fans one grouped `COUNT(*)` query per dimension out to the
//! data source, and cleans the gathered rows into sorted value lists.
//!
//! Per-dimension failures and timeouts degrade that dimension to an empty
//! list. Only a missing descriptor or an interrupted gather fail the lookup.

mod postprocess;
mod telemetry;
mod window;

pub use postprocess::{clean_values, extract_values, post_process};
pub use window::{TimeWindow, TimeWindowResolver};

use crate::clock::Clock;
use crate::config::FilterConfig;
use crate::gather::{ExecutionContext, ScatterGather};
use crate::metadata::MetadataClient;
use crate::query::{build_queries, MetricFunction, QueryExecutor};
use crate::{Error, Result};

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Dimension name to sorted, distinct values
pub type DimensionFilterMap = BTreeMap<String, Vec<String>>;

/// Orchestrates dimension filter lookups
pub struct DimensionFilterService {
    metadata: Arc<dyn MetadataClient>,
    resolver: TimeWindowResolver,
    gather: ScatterGather,
    shutdown: CancellationToken,
}

impl DimensionFilterService {
    /// Create a service with a 7 day lookback and the system clock
    pub fn new(metadata: Arc<dyn MetadataClient>, ctx: ExecutionContext) -> Self {
        Self {
            metadata,
            resolver: TimeWindowResolver::new(Arc::clone(ctx.executor())),
            shutdown: ctx.shutdown_token(),
            gather: ScatterGather::new(ctx),
        }
    }

    pub fn from_config(
        metadata: Arc<dyn MetadataClient>,
        executor: Arc<dyn QueryExecutor>,
        config: &FilterConfig,
    ) -> Self {
        let ctx = ExecutionContext::from_config(executor, config);
        Self::new(metadata, ctx).with_lookback(config.lookback)
    }

    /// Clock used when the data source cannot report its latest data time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.resolver = self.resolver.with_clock(clock);
        self
    }

    pub fn with_lookback(mut self, lookback: chrono::Duration) -> Self {
        self.resolver = self.resolver.with_lookback(lookback);
        self
    }

    /// Look up values for every dimension of the dataset
    pub async fn get_dimension_filters(&self, dataset: &str) -> Result<DimensionFilterMap> {
        self.lookup(dataset, None).await
    }

    /// Look up values for the given dimensions only
    pub async fn get_dimension_filters_for(
        &self,
        dataset: &str,
        dimensions: &[String],
    ) -> Result<DimensionFilterMap> {
        self.lookup(dataset, Some(dimensions)).await
    }

    async fn lookup(
        &self,
        dataset: &str,
        dimensions: Option<&[String]>,
    ) -> Result<DimensionFilterMap> {
        let started = Instant::now();
        let result = self
            .run_lookup(dataset, dimensions)
            .instrument(info_span!("filters.lookup", dataset = %dataset))
            .await;

        let (outcome, dimensions_returned) = match &result {
            Ok(filters) => ("success", filters.len() as u64),
            Err(Error::Interrupted { partial, .. }) => ("interrupted", partial.len() as u64),
            Err(Error::DatasetNotFound(_)) => ("dataset_not_found", 0),
            Err(_) => ("error", 0),
        };
        telemetry::record_lookup(telemetry::LookupMetrics {
            outcome,
            duration_seconds: started.elapsed().as_secs_f64(),
            dimensions_returned,
        });

        result
    }

    async fn run_lookup(
        &self,
        dataset: &str,
        dimensions: Option<&[String]>,
    ) -> Result<DimensionFilterMap> {
        let descriptor = self
            .until_shutdown(dataset, self.metadata.get_dataset_config(dataset))
            .await??
            .ok_or_else(|| Error::DatasetNotFound(dataset.to_string()))?;

        let window = self
            .until_shutdown(dataset, self.resolver.resolve(dataset))
            .await??;
        let dimensions = match dimensions {
            Some(dimensions) => dimensions.to_vec(),
            None => descriptor.sorted_dimensions(),
        };

        debug!(
            "Loading dimension filters for {} dimension(s) in [{}, {})",
            dimensions.len(),
            window.start,
            window.end
        );

        let metric = MetricFunction::count_star(dataset);
        let queries = build_queries(
            &metric,
            &dimensions,
            window.start,
            window.end,
            &descriptor.data_source,
        );

        let report = self.gather.gather(dataset, &queries).await;
        let filters = post_process(&report.outcomes, &descriptor, &metric);

        if !report.is_complete() {
            return Err(Error::Interrupted {
                dataset: dataset.to_string(),
                partial: filters,
            });
        }

        info!(
            dimensions = filters.len(),
            degraded = filters.values().filter(|v| v.is_empty()).count(),
            "Dimension filters loaded"
        );
        Ok(filters)
    }

    /// Run a pre-gather step, giving up with an empty partial result if the
    /// shutdown token fires first.
    async fn until_shutdown<T>(&self, dataset: &str, step: impl Future<Output = T>) -> Result<T> {
        tokio::select! {
            biased;
            value = step => Ok(value),
            _ = self.shutdown.cancelled() => {
                warn!("Lookup interrupted before any filter query was issued");
                Err(Error::Interrupted {
                    dataset: dataset.to_string(),
                    partial: DimensionFilterMap::new(),
                })
            }
        }
    }
}
