//! # dimfilters
//!
//! Scatter-gather lookup of dimension filter values for time-series datasets.
//!
//! Given a dataset, dimfilters asks the data source for the distinct values
//! of every dimension over the most recent window of data. One grouped query
//! per dimension is issued concurrently; each is bounded by its own timeout,
//! and a slow or failing dimension degrades to an empty value list instead of
//! failing the whole lookup.
//!
//! ## Architecture
//!
//! - **Window resolution**: latest data time from the data source, falling
//!   back to the wall clock
//! - **Sub-query generation**: one `COUNT(*) GROUP BY dimension` per dimension
//! - **Scatter-gather**: tokio tasks with per-query timeouts and cooperative
//!   cancellation
//! - **Post-processing**: sentinel exclusion for non-additive datasets,
//!   ordinal sorting, time column removal
//!
//! ## Example
//!
//! ```no_run
//! use dimfilters::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> dimfilters::Result<()> {
//! let metadata = Arc::new(LocalMetadataClient::from_json_file("catalog.json")?);
//! let executor = Arc::new(StaticQueryExecutor::from_json_file("rows.json")?);
//! let service = DimensionFilterService::from_config(metadata, executor, &FilterConfig::default());
//!
//! let filters = service.get_dimension_filters("pageviews").await?;
//! for (dimension, values) in &filters {
//!     println!("{dimension}: {values:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod filters;
pub mod gather;
pub mod metadata;
pub mod query;
pub mod telemetry;

mod error;

pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::clock::{BoundedClock, Clock, FixedClock};
    pub use crate::config::{ComponentFactory, FilterConfig};
    pub use crate::filters::{DimensionFilterMap, DimensionFilterService, TimeWindow};
    pub use crate::gather::{ExecutionContext, GatherReport, QueryOutcome, ScatterGather};
    pub use crate::metadata::{DatasetDescriptor, LocalMetadataClient, MetadataClient};
    pub use crate::query::{
        MetricFunction, QueryExecutor, QueryResponse, ResponseRow, StaticQueryExecutor, SubQuery,
    };
    pub use crate::{Error, Result};
}
