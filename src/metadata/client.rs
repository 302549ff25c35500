//! Metadata client trait

use super::DatasetDescriptor;
use crate::Result;
use async_trait::async_trait;

/// Metadata client interface
///
/// Abstracts the store that owns dataset descriptors so callers pass the
/// lookup in explicitly instead of reaching for a global registry.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Get the descriptor registered for a dataset, if any
    async fn get_dataset_config(&self, dataset: &str) -> Result<Option<DatasetDescriptor>>;

    /// List registered dataset names
    async fn list_datasets(&self) -> Result<Vec<String>>;
}
