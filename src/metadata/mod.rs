//! Dataset metadata for dimension filter lookups
//!
//! Dataset descriptors carry the per-dataset rules applied to raw filter
//! values: which column is the time column, whether rows may already be
//! pre-aggregated, and which sentinel value marks a rollup.

mod client;
mod local;

pub use client::MetadataClient;
pub use local::{DatasetCatalog, LocalMetadataClient};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default sentinel for rows rolled up across a dimension
pub const DEFAULT_PRE_AGGREGATED_KEYWORD: &str = "all";

/// Default data source identifier
pub const DEFAULT_DATA_SOURCE: &str = "default";

/// Descriptor for a single dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Dataset name
    pub dataset: String,
    /// Dimension names in declaration order
    pub dimensions: Vec<String>,
    /// Designated time column
    pub time_column: String,
    /// Additive datasets never contain pre-aggregated rows
    #[serde(default = "default_additive")]
    pub additive: bool,
    /// Dimensions exempt from pre-aggregation filtering
    #[serde(default)]
    pub dimensions_without_pre_aggregation: BTreeSet<String>,
    /// Value denoting a pre-aggregated rollup
    #[serde(default = "default_pre_aggregated_keyword")]
    pub pre_aggregated_keyword: String,
    /// Data source the dataset's queries are sent to
    #[serde(default = "default_data_source")]
    pub data_source: String,
}

fn default_additive() -> bool {
    true
}

fn default_pre_aggregated_keyword() -> String {
    DEFAULT_PRE_AGGREGATED_KEYWORD.to_string()
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE.to_string()
}

impl DatasetDescriptor {
    /// Create an additive descriptor with default sentinel and data source
    pub fn new(
        dataset: impl Into<String>,
        dimensions: impl IntoIterator<Item = impl Into<String>>,
        time_column: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            time_column: time_column.into(),
            additive: default_additive(),
            dimensions_without_pre_aggregation: BTreeSet::new(),
            pre_aggregated_keyword: default_pre_aggregated_keyword(),
            data_source: default_data_source(),
        }
    }

    pub fn with_additive(mut self, additive: bool) -> Self {
        self.additive = additive;
        self
    }

    /// Exempt a dimension from pre-aggregation filtering
    pub fn with_exempt_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimensions_without_pre_aggregation
            .insert(dimension.into());
        self
    }

    pub fn with_pre_aggregated_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.pre_aggregated_keyword = keyword.into();
        self
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    /// Dimension names sorted ordinally. This is the default lookup order.
    pub fn sorted_dimensions(&self) -> Vec<String> {
        let mut dimensions = self.dimensions.clone();
        dimensions.sort();
        dimensions
    }

    /// Whether the pre-aggregation sentinel must be stripped from a
    /// dimension's values.
    pub fn excludes_pre_aggregated(&self, dimension: &str) -> bool {
        !self.additive && !self.dimensions_without_pre_aggregation.contains(dimension)
    }
}
