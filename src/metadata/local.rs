//! Local in-memory metadata client for development and testing

use super::{DatasetDescriptor, MetadataClient};
use crate::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk catalog of dataset descriptors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetCatalog {
    pub datasets: Vec<DatasetDescriptor>,
}

/// Local in-memory metadata client
///
/// Suitable for development, tests and single-process deployments where
/// the descriptor catalog ships as a JSON file.
#[derive(Debug, Default)]
pub struct LocalMetadataClient {
    /// Descriptors by dataset name
    datasets: DashMap<String, DatasetDescriptor>,
}

impl LocalMetadataClient {
    /// Create an empty client
    pub fn new() -> Self {
        Self {
            datasets: DashMap::new(),
        }
    }

    /// Create a client pre-populated with descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = DatasetDescriptor>) -> Self {
        let client = Self::new();
        for descriptor in descriptors {
            client.register_dataset(descriptor);
        }
        client
    }

    /// Load a JSON catalog file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog: DatasetCatalog = serde_json::from_str(&raw)?;
        info!(
            "Loaded {} dataset descriptor(s) from {}",
            catalog.datasets.len(),
            path.display()
        );
        Ok(Self::from_descriptors(catalog.datasets))
    }

    /// Register or replace a descriptor
    pub fn register_dataset(&self, descriptor: DatasetDescriptor) {
        self.datasets.insert(descriptor.dataset.clone(), descriptor);
    }

    /// Remove a descriptor, returning it if present
    pub fn remove_dataset(&self, dataset: &str) -> Option<DatasetDescriptor> {
        self.datasets.remove(dataset).map(|(_, d)| d)
    }
}

#[async_trait]
impl MetadataClient for LocalMetadataClient {
    async fn get_dataset_config(&self, dataset: &str) -> Result<Option<DatasetDescriptor>> {
        Ok(self.datasets.get(dataset).map(|e| e.value().clone()))
    }

    async fn list_datasets(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.datasets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_register_and_get_dataset() {
        let client = LocalMetadataClient::new();
        client.register_dataset(DatasetDescriptor::new("pageviews", ["country"], "time"));

        let result = client.get_dataset_config("pageviews").await.unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().time_column, "time");

        let missing = client.get_dataset_config("clicks").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_register_replaces_existing() {
        let client = LocalMetadataClient::new();
        client.register_dataset(DatasetDescriptor::new("pageviews", ["country"], "time"));
        client.register_dataset(
            DatasetDescriptor::new("pageviews", ["country"], "time").with_additive(false),
        );

        let descriptor = client.get_dataset_config("pageviews").await.unwrap().unwrap();
        assert!(!descriptor.additive);
        assert_eq!(client.list_datasets().await.unwrap().len(), 1);

        assert!(client.remove_dataset("pageviews").is_some());
        assert!(client.list_datasets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"datasets": [
                {{"dataset": "pageviews", "dimensions": ["country", "device"], "time_column": "time",
                  "additive": false, "dimensions_without_pre_aggregation": ["device"]}},
                {{"dataset": "clicks", "dimensions": ["campaign"], "time_column": "ts"}}
            ]}}"#
        )
        .unwrap();

        let client = LocalMetadataClient::from_json_file(file.path()).unwrap();
        assert_eq!(
            client.list_datasets().await.unwrap(),
            vec!["clicks".to_string(), "pageviews".to_string()]
        );

        let pageviews = client.get_dataset_config("pageviews").await.unwrap().unwrap();
        assert!(pageviews.excludes_pre_aggregated("country"));
        assert!(!pageviews.excludes_pre_aggregated("device"));
    }

    #[test]
    fn test_load_rejects_malformed_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = LocalMetadataClient::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }
}
