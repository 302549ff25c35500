//! Configuration and component factory
//!
//! Lookup tuning comes from [`FilterConfig`]; the factory builds the
//! metadata client from environment variables so binaries can switch
//! between an empty in-memory store and a catalog file.

use crate::metadata::{LocalMetadataClient, MetadataClient};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Tuning for dimension filter lookups
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Wait bound for each sub-query, measured from when it starts executing
    pub per_query_timeout: Duration,
    /// Maximum sub-queries in flight per lookup (`None` = unbounded fan-out)
    pub max_concurrency: Option<usize>,
    /// Length of the query window ending at the latest data time
    pub lookback: chrono::Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            per_query_timeout: Duration::from_secs(60),
            max_concurrency: None,
            lookback: chrono::Duration::days(7),
        }
    }
}

impl FilterConfig {
    /// Read overrides from the environment
    ///
    /// Environment variables:
    /// - DIMFILTERS_QUERY_TIMEOUT_MS: per sub-query timeout (default: 60000)
    /// - DIMFILTERS_MAX_CONCURRENCY: in-flight sub-query limit (default: unbounded, 0 = unbounded)
    /// - DIMFILTERS_LOOKBACK_DAYS: query window length in days (default: 7)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("DIMFILTERS_QUERY_TIMEOUT_MS") {
            let millis = parse_u64("DIMFILTERS_QUERY_TIMEOUT_MS", &raw)?;
            config.per_query_timeout =
                query_timeout_from_millis("DIMFILTERS_QUERY_TIMEOUT_MS", millis)?;
        }

        if let Some(raw) = lookup("DIMFILTERS_MAX_CONCURRENCY") {
            let limit = parse_u64("DIMFILTERS_MAX_CONCURRENCY", &raw)? as usize;
            config.max_concurrency = (limit > 0).then_some(limit);
        }

        if let Some(raw) = lookup("DIMFILTERS_LOOKBACK_DAYS") {
            let days = parse_u64("DIMFILTERS_LOOKBACK_DAYS", &raw)?;
            config.lookback = lookback_from_days("DIMFILTERS_LOOKBACK_DAYS", days)?;
        }

        Ok(config)
    }
}

/// Longest accepted query window, in days
pub const MAX_LOOKBACK_DAYS: u64 = 3650;

/// Validate a per sub-query timeout. `setting` names the source in errors.
pub fn query_timeout_from_millis(setting: &str, millis: u64) -> Result<Duration> {
    if millis == 0 {
        return Err(Error::Config(format!("{setting} must be greater than zero")));
    }
    Ok(Duration::from_millis(millis))
}

/// Validate a lookback length. `setting` names the source in errors.
pub fn lookback_from_days(setting: &str, days: u64) -> Result<chrono::Duration> {
    if days == 0 || days > MAX_LOOKBACK_DAYS {
        return Err(Error::Config(format!(
            "{setting} must be in [1, {MAX_LOOKBACK_DAYS}], got {days}"
        )));
    }
    Ok(chrono::Duration::days(days as i64))
}

fn parse_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| {
        Error::Config(format!(
            "{name} must be a non-negative integer, got '{raw}': {e}"
        ))
    })
}

pub struct ComponentFactory;

impl ComponentFactory {
    /// Create metadata client from environment
    ///
    /// Environment variables:
    /// - METADATA_BACKEND: "local" (default, empty store) or "file"
    /// - DATASET_CATALOG: JSON catalog path (required for file)
    pub fn create_metadata_client() -> Result<Arc<dyn MetadataClient>> {
        let backend = std::env::var("METADATA_BACKEND").unwrap_or_else(|_| "local".to_string());
        let catalog = std::env::var("DATASET_CATALOG").ok();
        Self::create_metadata_client_for(&backend, catalog.as_deref())
    }

    pub fn create_metadata_client_for(
        backend: &str,
        catalog: Option<&str>,
    ) -> Result<Arc<dyn MetadataClient>> {
        match backend {
            "local" => {
                info!("Using empty LocalMetadataClient (development mode)");
                Ok(Arc::new(LocalMetadataClient::new()))
            }
            "file" => {
                let path = catalog.ok_or_else(|| {
                    Error::Config("DATASET_CATALOG required when METADATA_BACKEND=file".to_string())
                })?;
                info!("Using dataset catalog file: {}", path);
                Ok(Arc::new(LocalMetadataClient::from_json_file(path)?))
            }
            _ => Err(Error::Config(format!(
                "Unknown METADATA_BACKEND: {}. Use 'local' or 'file'",
                backend
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FilterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.per_query_timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.lookback, chrono::Duration::days(7));
    }

    #[test]
    fn test_overrides() {
        let config = FilterConfig::from_lookup(lookup(&[
            ("DIMFILTERS_QUERY_TIMEOUT_MS", "1500"),
            ("DIMFILTERS_MAX_CONCURRENCY", "4"),
            ("DIMFILTERS_LOOKBACK_DAYS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.per_query_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_concurrency, Some(4));
        assert_eq!(config.lookback, chrono::Duration::days(30));
    }

    #[test]
    fn test_zero_concurrency_means_unbounded() {
        let config =
            FilterConfig::from_lookup(lookup(&[("DIMFILTERS_MAX_CONCURRENCY", "0")])).unwrap();
        assert_eq!(config.max_concurrency, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FilterConfig::from_lookup(lookup(&[("DIMFILTERS_QUERY_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(format!("{err}").contains("DIMFILTERS_QUERY_TIMEOUT_MS"));

        let err = FilterConfig::from_lookup(lookup(&[("DIMFILTERS_QUERY_TIMEOUT_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = FilterConfig::from_lookup(lookup(&[("DIMFILTERS_LOOKBACK_DAYS", "0")]))
            .unwrap_err();
        assert!(format!("{err}").contains("DIMFILTERS_LOOKBACK_DAYS"));
    }

    #[test]
    fn test_validators_shared_with_cli() {
        assert_eq!(
            query_timeout_from_millis("--timeout-ms", 1).unwrap(),
            Duration::from_millis(1)
        );
        let err = query_timeout_from_millis("--timeout-ms", 0).unwrap_err();
        assert!(format!("{err}").contains("--timeout-ms"));

        assert_eq!(
            lookback_from_days("--lookback-days", MAX_LOOKBACK_DAYS).unwrap(),
            chrono::Duration::days(3650)
        );
        assert!(lookback_from_days("--lookback-days", 0).is_err());
        let err = lookback_from_days("--lookback-days", 200_000_000).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("--lookback-days")));
    }

    #[test]
    fn test_factory_backends() {
        assert!(ComponentFactory::create_metadata_client_for("local", None).is_ok());

        let err = ComponentFactory::create_metadata_client_for("file", None)
            .err()
            .unwrap();
        assert!(format!("{err}").contains("DATASET_CATALOG"));

        let err = ComponentFactory::create_metadata_client_for("zookeeper", None)
            .err()
            .unwrap();
        assert!(format!("{err}").contains("Unknown METADATA_BACKEND"));
    }
}
